use mms_core::CoreError;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised by the world and the simulation runner.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// No mouse is registered under this name.
    #[error("mouse not found in simulation: \"{0}\"")]
    UnknownMouse(String),

    /// A mouse with this name is already registered.
    #[error("mouse already registered: \"{0}\"")]
    DuplicateMouse(String),

    /// The world has no maze yet.
    #[error("no maze installed; call set_maze before adding mice or stepping")]
    MazeNotSet,

    /// The mouse was built against a different maze than the world's.
    #[error("mouse \"{0}\" was built for a different maze")]
    ForeignMaze(String),

    /// A speed multiplier outside `0.0..=MAX_SPEED`.
    #[error("invalid simulation speed: {0}")]
    InvalidSpeed(f64),

    /// An error from the core model.
    #[error(transparent)]
    Core(#[from] CoreError),
}
