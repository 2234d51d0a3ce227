//! Core types for the micromouse simulator.
//!
//! Everything the physical simulation is made of lives here: the polygon
//! kernel, the static maze, wheel and sensor models, and the
//! differential-drive [`Mouse`] with its Euler integrator. Orchestration
//! (stepping, collisions, statistics) lives in `mms-simulation`.

/// Error types used throughout the crate.
pub mod error;
/// Immutable 2D polygons and the geometric tests built on them.
pub mod geometry;
/// Static tile grid with precomputed wall polygons.
pub mod maze;
/// The differential-drive mouse body.
pub mod mouse;
/// Proximity sensors and their occlusion model.
pub mod sensor;
/// Drive wheels.
pub mod wheel;

/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export geometry types.
pub use geometry::{Aabb, Polygon, convex_hull};
/// Re-export maze types.
pub use maze::{Direction, Maze, MazeGeometry, MazeLayout, Tile, TileCoord, Walls};
/// Re-export mouse types.
pub use mouse::{Mouse, MouseSpec, Pose};
/// Re-export sensor types.
pub use sensor::{Sensor, SensorSpec};
/// Re-export wheel types.
pub use wheel::{Wheel, WheelSpec};
