use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Wall-clock time the runner sleeps between steps.
    pub tick_interval: Duration,
    /// Largest simulation time handed to a single integration step.
    pub max_step: Duration,
    /// Initial simulation speed multiplier.
    pub sim_speed: f64,
    /// Whether the clock starts paused.
    pub start_paused: bool,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            max_step: Duration::from_millis(1),
            sim_speed: 1.0,
            start_paused: false,
            max_events: 0,
        }
    }
}

impl SimConfig {
    /// Set the wall-clock interval between runner steps.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the largest integration step.
    pub fn with_max_step(mut self, step: Duration) -> Self {
        self.max_step = step;
        self
    }

    /// Set the initial speed multiplier.
    pub fn with_sim_speed(mut self, speed: f64) -> Self {
        self.sim_speed = speed;
        self
    }

    /// Start with the clock paused.
    pub fn with_start_paused(mut self, paused: bool) -> Self {
        self.start_paused = paused;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }
}
