use std::collections::HashSet;
use std::time::Duration;

use mms_core::{Maze, TileCoord};
use serde::Serialize;

/// Snapshot of one mouse's traversal statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MouseStats {
    /// Distinct tiles entered, not counting the starting tile.
    pub tiles_traversed: usize,
    /// Smallest Manhattan tile distance to the center region seen so far.
    pub closest_distance_to_center: u32,
    /// Simulation time since the mouse last left the origin tile, if it is
    /// currently away from it.
    pub time_since_origin_departure: Option<Duration>,
    /// Fastest origin-to-center run observed, if any.
    pub best_time_to_center: Option<Duration>,
}

/// What a tile change meant for the statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TileChange {
    pub departed_origin: bool,
    pub reached_center: Option<Duration>,
}

/// Running statistics for one mouse.
#[derive(Debug, Clone)]
pub(crate) struct StatsTracker {
    start: TileCoord,
    current: TileCoord,
    visited: HashSet<TileCoord>,
    closest_distance_to_center: u32,
    departed_at: Option<Duration>,
    best_time_to_center: Option<Duration>,
}

impl StatsTracker {
    pub fn new(start: TileCoord, maze: &Maze) -> Self {
        Self {
            start,
            current: start,
            visited: HashSet::new(),
            closest_distance_to_center: maze.distance_to_center(start),
            departed_at: None,
            best_time_to_center: None,
        }
    }

    pub fn current_tile(&self) -> TileCoord {
        self.current
    }

    /// Record a move into `tile` at simulation time `now`.
    pub fn enter(&mut self, tile: TileCoord, now: Duration, maze: &Maze) -> TileChange {
        let previous = std::mem::replace(&mut self.current, tile);
        let mut change = TileChange::default();

        if tile != self.start {
            self.visited.insert(tile);
        }
        self.closest_distance_to_center = self
            .closest_distance_to_center
            .min(maze.distance_to_center(tile));

        if tile == TileCoord::ORIGIN {
            self.departed_at = None;
        } else if previous == TileCoord::ORIGIN {
            self.departed_at = Some(now);
            change.departed_origin = true;
        }

        if let Some(departed) = self.departed_at.filter(|_| maze.is_center(tile)) {
            let elapsed = now.saturating_sub(departed);
            self.best_time_to_center = Some(
                self.best_time_to_center
                    .map_or(elapsed, |best| best.min(elapsed)),
            );
            change.reached_center = Some(elapsed);
        }

        change
    }

    pub fn snapshot(&self, now: Duration) -> MouseStats {
        MouseStats {
            tiles_traversed: self.visited.len(),
            closest_distance_to_center: self.closest_distance_to_center,
            time_since_origin_departure: self.departed_at.map(|d| now.saturating_sub(d)),
            best_time_to_center: self.best_time_to_center,
        }
    }
}
