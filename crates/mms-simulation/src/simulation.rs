use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::clock::{SimClock, SystemTimeSource, TimeSource};
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::world::World;

/// The top-level simulation runner.
///
/// Owns the world, the dual clock and a time source. Real time measured
/// from the time source is converted to simulation time by the clock and
/// fed to the world in steps no longer than `max_step`.
pub struct Simulation<T: TimeSource = SystemTimeSource> {
    world: World,
    clock: SimClock,
    config: SimConfig,
    time: T,
    last_real: Option<Duration>,
}

impl<T: TimeSource> std::fmt::Debug for Simulation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish()
    }
}

impl Simulation<SystemTimeSource> {
    /// Create a runner driven by the wall clock.
    pub fn new(world: World, config: SimConfig) -> SimResult<Self> {
        Self::with_time_source(world, config, SystemTimeSource::default())
    }
}

impl<T: TimeSource> Simulation<T> {
    /// Create a runner driven by an explicit time source.
    pub fn with_time_source(world: World, config: SimConfig, time: T) -> SimResult<Self> {
        let mut clock = SimClock::new(config.sim_speed)?;
        if config.start_paused {
            clock.pause();
        }
        Ok(Self {
            world,
            clock,
            config,
            time,
            last_real: None,
        })
    }

    /// Account for `real_delta` of wall-clock time and step the world by the
    /// resulting simulation time. Returns the simulation time stepped.
    pub fn advance(&mut self, real_delta: Duration) -> SimResult<Duration> {
        let sim_delta = self.clock.advance(real_delta);
        self.step_world(sim_delta)?;
        Ok(sim_delta)
    }

    /// Measure real time since the previous call and advance by it. The
    /// first call only starts the measurement.
    pub fn step(&mut self) -> SimResult<Duration> {
        let now = self.time.now();
        let real_delta = match self.last_real.replace(now) {
            Some(last) => now.saturating_sub(last),
            None => Duration::ZERO,
        };
        self.advance(real_delta)
    }

    /// Step in real time until `stop` is raised.
    pub fn run(&mut self, stop: &AtomicBool) -> SimResult<()> {
        self.run_until(Duration::MAX, stop)
    }

    /// Step in real time until the world has simulated `sim_limit` or `stop`
    /// is raised, whichever comes first.
    pub fn run_until(&mut self, sim_limit: Duration, stop: &AtomicBool) -> SimResult<()> {
        tracing::info!(
            speed = self.clock.speed(),
            paused = self.clock.is_paused(),
            "simulation started"
        );
        while !stop.load(Ordering::Acquire) && self.world.sim_time() < sim_limit {
            self.step()?;
            self.time.sleep(self.config.tick_interval);
        }
        tracing::info!(
            ticks = self.world.tick(),
            sim_seconds = self.world.sim_time().as_secs_f64(),
            real_seconds = self.clock.elapsed_real_time().as_secs_f64(),
            "simulation stopped"
        );
        Ok(())
    }

    /// Step the world by `sim_duration` without consulting the clock or
    /// time source. Ignores pause and speed.
    pub fn run_for(&mut self, sim_duration: Duration) -> SimResult<()> {
        self.step_world(sim_duration)
    }

    fn step_world(&mut self, mut remaining: Duration) -> SimResult<()> {
        let max_step = if self.config.max_step.is_zero() {
            remaining
        } else {
            self.config.max_step
        };
        while !remaining.is_zero() {
            let dt = remaining.min(max_step);
            self.world.step(dt)?;
            remaining -= dt;
        }
        Ok(())
    }

    /// The simulated world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the simulated world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The dual clock.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Mutable access to the dual clock, for pausing and speed changes.
    pub fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    /// The configuration this runner was built with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTimeSource;
    use crate::error::SimError;
    use mms_core::{Maze, MazeGeometry, MazeLayout, MouseSpec, TileCoord};
    use std::sync::Arc;

    fn open_world() -> World {
        let mut world = World::new(0);
        world.set_maze(Arc::new(
            Maze::new(&MazeLayout::open(4, 4), MazeGeometry::default()).unwrap(),
        ));
        world
    }

    fn manual(config: SimConfig) -> Simulation<ManualTimeSource> {
        Simulation::with_time_source(open_world(), config, ManualTimeSource::new()).unwrap()
    }

    #[test]
    fn advance_sub_steps_by_max_step() {
        let mut sim = manual(SimConfig::default().with_max_step(Duration::from_millis(2)));
        let stepped = sim.advance(Duration::from_millis(7)).unwrap();
        assert_eq!(stepped, Duration::from_millis(7));
        assert_eq!(sim.world().tick(), 4);
        assert_eq!(sim.world().sim_time(), Duration::from_millis(7));
    }

    #[test]
    fn speed_scales_stepped_time() {
        let mut sim = manual(SimConfig::default().with_sim_speed(3.0));
        sim.advance(Duration::from_millis(10)).unwrap();
        assert_eq!(sim.world().sim_time(), Duration::from_millis(30));
        assert_eq!(sim.clock().elapsed_real_time(), Duration::from_millis(10));
    }

    #[test]
    fn start_paused_holds_the_world() {
        let mut sim = manual(SimConfig::default().with_start_paused(true));
        assert!(sim.clock().is_paused());
        sim.advance(Duration::from_millis(50)).unwrap();
        assert_eq!(sim.world().tick(), 0);

        sim.clock_mut().resume();
        sim.advance(Duration::from_millis(5)).unwrap();
        assert_eq!(sim.world().sim_time(), Duration::from_millis(5));
    }

    #[test]
    fn step_measures_the_time_source() {
        let mut sim = manual(SimConfig::default());
        assert_eq!(sim.step().unwrap(), Duration::ZERO);
        sim.time.advance(Duration::from_millis(12));
        assert_eq!(sim.step().unwrap(), Duration::from_millis(12));
        assert_eq!(sim.world().tick(), 12);
    }

    #[test]
    fn run_until_stops_at_the_limit() {
        let mut sim = manual(SimConfig::default().with_tick_interval(Duration::from_millis(10)));
        let stop = AtomicBool::new(false);
        sim.run_until(Duration::from_millis(100), &stop).unwrap();
        assert!(sim.world().sim_time() >= Duration::from_millis(100));
        assert!(sim.world().sim_time() <= Duration::from_millis(110));
    }

    #[test]
    fn raised_stop_flag_runs_nothing() {
        let mut sim = manual(SimConfig::default());
        let stop = AtomicBool::new(true);
        sim.run(&stop).unwrap();
        assert_eq!(sim.world().tick(), 0);
    }

    #[test]
    fn run_for_is_deterministic() {
        let drive = |sim: &mut Simulation<ManualTimeSource>| {
            let mouse = sim
                .world_mut()
                .spawn_mouse("m", &MouseSpec::micromouse(), TileCoord::new(1, 1))
                .unwrap();
            mouse.set_wheel_speeds(6.0, 9.0);
            sim.run_for(Duration::from_millis(750)).unwrap();
            mouse.pose()
        };
        let a = drive(&mut manual(SimConfig::default()));
        let b = drive(&mut manual(SimConfig::default()));
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_speed_is_rejected() {
        let err = Simulation::with_time_source(
            open_world(),
            SimConfig::default().with_sim_speed(-2.0),
            ManualTimeSource::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidSpeed(_)));
    }
}
