//! Simulation orchestration for the micromouse simulator.
//!
//! A [`World`] owns the maze and the registered mice and performs the
//! per-step integration, collision and traversal passes. A [`Simulation`]
//! drives a world from real time through a pausable, speed-scaled
//! [`SimClock`]. Control agents talk to mice through [`MouseInterface`]
//! from their own threads.

/// Dual real/simulation clock and time sources.
pub mod clock;
/// Configuration types for simulation runs.
pub mod config;
/// The control-agent interface.
pub mod control;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event log.
pub mod event;
/// Top-level simulation runner.
pub mod simulation;
/// Per-mouse traversal statistics.
pub mod stats;
/// The maze, its mice and the per-step passes.
pub mod world;

/// Re-exports of [`clock::SimClock`] and the time sources.
pub use clock::{MAX_SPEED, ManualTimeSource, SimClock, SystemTimeSource, TimeSource};
/// Re-export of [`config::SimConfig`].
pub use config::SimConfig;
/// Re-export of [`control::MouseInterface`].
pub use control::MouseInterface;
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of [`event::EventLog`], [`event::SimEvent`], and [`event::SimEventKind`].
pub use event::{EventLog, SimEvent, SimEventKind};
/// Re-export of [`simulation::Simulation`].
pub use simulation::Simulation;
/// Re-export of [`stats::MouseStats`].
pub use stats::MouseStats;
/// Re-exports of [`world::World`] and [`world::TraversalListener`].
pub use world::{TraversalListener, World};
