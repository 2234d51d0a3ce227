use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::{SimError, SimResult};

/// Largest accepted speed multiplier.
pub const MAX_SPEED: f64 = 1000.0;

/// Tracks elapsed real time and elapsed simulation time side by side.
///
/// Real time always advances; simulation time advances only while unpaused,
/// scaled by the speed multiplier in effect at the time of each advance.
#[derive(Debug, Clone)]
pub struct SimClock {
    elapsed_real: Duration,
    elapsed_sim: Duration,
    paused: bool,
    speed: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            elapsed_real: Duration::ZERO,
            elapsed_sim: Duration::ZERO,
            paused: false,
            speed: 1.0,
        }
    }
}

impl SimClock {
    /// Create a running clock at the given speed multiplier.
    pub fn new(speed: f64) -> SimResult<Self> {
        let mut clock = Self::default();
        clock.set_speed(speed)?;
        Ok(clock)
    }

    /// Account for `real_delta` of wall-clock time. Returns the simulation
    /// time that elapsed as a result (zero while paused).
    pub fn advance(&mut self, real_delta: Duration) -> Duration {
        self.elapsed_real = self.elapsed_real.saturating_add(real_delta);
        if self.paused {
            return Duration::ZERO;
        }
        let sim_delta = Duration::try_from_secs_f64(real_delta.as_secs_f64() * self.speed)
            .unwrap_or(Duration::MAX);
        self.elapsed_sim = self.elapsed_sim.saturating_add(sim_delta);
        sim_delta
    }

    /// Stop simulation time from advancing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Let simulation time advance again.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Flip between paused and running. Returns the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Return `true` while paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Change the speed multiplier for subsequent advances. Accepts
    /// `0.0..=MAX_SPEED`.
    pub fn set_speed(&mut self, speed: f64) -> SimResult<()> {
        if !(0.0..=MAX_SPEED).contains(&speed) {
            return Err(SimError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Current speed multiplier.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Total wall-clock time accounted for.
    pub fn elapsed_real_time(&self) -> Duration {
        self.elapsed_real
    }

    /// Total simulation time accounted for.
    pub fn elapsed_sim_time(&self) -> Duration {
        self.elapsed_sim
    }
}

/// A monotonic source of wall-clock time.
pub trait TimeSource: Send {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock time.
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A time source that only moves when told to. Sleeping advances it
/// instantly, so run loops make progress without waiting.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    nanos: AtomicU64,
}

impl ManualTimeSource {
    /// Start at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
