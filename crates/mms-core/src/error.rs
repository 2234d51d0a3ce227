/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or querying the maze and the mouse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A polygon was built from fewer than three vertices.
    #[error("polygon needs at least 3 vertices, got {vertices}")]
    DegeneratePolygon {
        /// Number of vertices supplied.
        vertices: usize,
    },

    /// The two drive wheels are not mounted on the same axle line.
    #[error("wheels must share a mounting line: left y = {left_y}, right y = {right_y}")]
    AsymmetricWheelMount {
        /// Forward offset of the left wheel mount.
        left_y: f64,
        /// Forward offset of the right wheel mount.
        right_y: f64,
    },

    /// Both wheels are mounted at the same lateral position.
    #[error("wheel base is zero; the wheels must be laterally separated")]
    ZeroWheelBase,

    /// A sensor's full view encloses no area.
    #[error("sensor \"{0}\" has a full view with zero area")]
    DegenerateSensorView(String),

    /// The requested sensor name does not exist on the mouse.
    #[error("unknown sensor: \"{0}\"")]
    UnknownSensor(String),

    /// A maze layout is inconsistent with its declared dimensions.
    #[error("invalid maze: {0}")]
    InvalidMaze(String),

    /// A physical dimension is non-positive or not finite.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}
