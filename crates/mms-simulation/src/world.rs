use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use mms_core::{Maze, Mouse, MouseSpec, TileCoord};

use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEvent, SimEventKind};
use crate::stats::{MouseStats, StatsTracker};

/// Callback invoked with a mouse's name and the tile it just entered.
pub type TraversalListener = Box<dyn FnMut(&str, TileCoord) + Send>;

#[derive(Debug)]
struct Entry {
    mouse: Arc<Mouse>,
    stats: StatsTracker,
}

/// Owns the maze and every registered mouse, and runs the per-step
/// integration, collision and traversal passes.
pub struct World {
    maze: Option<Arc<Maze>>,
    mice: BTreeMap<String, Entry>,
    events: EventLog,
    listeners: Vec<TraversalListener>,
    sim_time: Duration,
    tick: u64,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("sim_time", &self.sim_time)
            .field("mice", &self.mice.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(0)
    }
}

impl World {
    /// Create an empty world whose event log keeps at most `max_events`
    /// entries (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            maze: None,
            mice: BTreeMap::new(),
            events: EventLog::new(max_events),
            listeners: Vec::new(),
            sim_time: Duration::ZERO,
            tick: 0,
        }
    }

    /// Install the static maze. Must happen before any mouse is added.
    pub fn set_maze(&mut self, maze: Arc<Maze>) {
        tracing::info!(
            width = maze.width(),
            height = maze.height(),
            "maze installed"
        );
        self.maze = Some(maze);
    }

    /// The installed maze.
    pub fn maze(&self) -> SimResult<&Arc<Maze>> {
        self.maze.as_ref().ok_or(SimError::MazeNotSet)
    }

    /// Register a mouse under a unique name and start its statistics from
    /// the tile it currently occupies.
    pub fn add_mouse(&mut self, name: impl Into<String>, mouse: Arc<Mouse>) -> SimResult<()> {
        let name = name.into();
        let maze = self.maze.as_ref().ok_or(SimError::MazeNotSet)?;
        if self.mice.contains_key(&name) {
            return Err(SimError::DuplicateMouse(name));
        }
        if !Arc::ptr_eq(maze, mouse.maze()) {
            return Err(SimError::ForeignMaze(name));
        }

        let start = mouse.discretized_translation();
        tracing::info!(mouse = %name, tile = %start, "mouse registered");
        let stats = StatsTracker::new(start, maze);
        self.mice.insert(name, Entry { mouse, stats });
        Ok(())
    }

    /// Build a mouse from `spec` with its axle midpoint at the center of
    /// `tile`, facing north, and register it.
    pub fn spawn_mouse(
        &mut self,
        name: impl Into<String>,
        spec: &MouseSpec,
        tile: TileCoord,
    ) -> SimResult<Arc<Mouse>> {
        let maze = Arc::clone(self.maze()?);
        let axle = (spec.left_wheel.position + spec.right_wheel.position) / 2.0;
        let start = maze.tile_center(tile) - axle;
        let mouse = Arc::new(Mouse::new(spec, start, maze)?);
        self.add_mouse(name, Arc::clone(&mouse))?;
        Ok(mouse)
    }

    /// Look up a registered mouse.
    pub fn mouse(&self, name: &str) -> SimResult<&Arc<Mouse>> {
        self.mice
            .get(name)
            .map(|entry| &entry.mouse)
            .ok_or_else(|| SimError::UnknownMouse(name.to_string()))
    }

    /// Names of all registered mice, in order.
    pub fn mouse_names(&self) -> impl Iterator<Item = &str> {
        self.mice.keys().map(String::as_str)
    }

    /// Snapshot of a mouse's statistics.
    pub fn mouse_stats(&self, name: &str) -> SimResult<MouseStats> {
        self.mice
            .get(name)
            .map(|entry| entry.stats.snapshot(self.sim_time))
            .ok_or_else(|| SimError::UnknownMouse(name.to_string()))
    }

    /// Register a callback for tile traversals.
    pub fn on_tile_traversed<F>(&mut self, listener: F)
    where
        F: FnMut(&str, TileCoord) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Total simulation time stepped so far.
    pub fn sim_time(&self) -> Duration {
        self.sim_time
    }

    /// Number of steps taken so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Events recorded so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Advance every mouse by `elapsed` simulation time, then run the
    /// collision and traversal passes.
    pub fn step(&mut self, elapsed: Duration) -> SimResult<()> {
        if self.maze.is_none() {
            return Err(SimError::MazeNotSet);
        }
        self.tick += 1;
        self.sim_time += elapsed;

        for entry in self.mice.values() {
            if !entry.mouse.is_crashed() {
                entry.mouse.update(elapsed);
            }
        }

        self.check_collision()?;
        self.track_traversal()
    }

    /// Mark every mouse whose collision polygon touches a wall as crashed.
    /// Returns the names of mice that crashed during this call.
    pub fn check_collision(&mut self) -> SimResult<Vec<String>> {
        let maze = Arc::clone(self.maze()?);
        let mut crashed = Vec::new();

        for (name, entry) in &self.mice {
            if entry.mouse.is_crashed() {
                continue;
            }
            let hull = entry.mouse.collision_polygon();
            let hit = maze
                .tiles_near(hull.bounding_box())
                .flat_map(|tile| tile.wall_polygons())
                .any(|wall| wall.intersects(&hull));
            if !hit {
                continue;
            }

            entry.mouse.set_crashed();
            let tile = entry.mouse.discretized_translation();
            tracing::warn!(mouse = %name, %tile, tick = self.tick, "mouse crashed");
            self.events.push(SimEvent::new(
                self.tick,
                self.sim_time,
                SimEventKind::Crashed {
                    mouse: name.clone(),
                    tile,
                },
                format!("{name} hit a wall in tile {tile}"),
            ));
            crashed.push(name.clone());
        }

        Ok(crashed)
    }

    fn track_traversal(&mut self) -> SimResult<()> {
        let maze = Arc::clone(self.maze()?);
        let now = self.sim_time;

        for (name, entry) in &mut self.mice {
            let from = entry.stats.current_tile();
            let to = entry.mouse.discretized_translation();
            if to == from {
                continue;
            }

            let change = entry.stats.enter(to, now, &maze);
            tracing::debug!(mouse = %name, %from, %to, "tile traversed");
            self.events.push(SimEvent::new(
                self.tick,
                now,
                SimEventKind::TileTraversed {
                    mouse: name.clone(),
                    from,
                    to,
                },
                format!("{name} moved from {from} to {to}"),
            ));
            if change.departed_origin {
                self.events.push(SimEvent::new(
                    self.tick,
                    now,
                    SimEventKind::OriginDeparted {
                        mouse: name.clone(),
                    },
                    format!("{name} left the origin"),
                ));
            }
            if let Some(time) = change.reached_center {
                tracing::info!(mouse = %name, seconds = time.as_secs_f64(), "center reached");
                self.events.push(SimEvent::new(
                    self.tick,
                    now,
                    SimEventKind::CenterReached {
                        mouse: name.clone(),
                        time,
                    },
                    format!("{name} reached the center in {:.3}s", time.as_secs_f64()),
                ));
            }
            for listener in &mut self.listeners {
                listener(name.as_str(), to);
            }
        }

        Ok(())
    }
}
