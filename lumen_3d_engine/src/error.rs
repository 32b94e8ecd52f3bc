//! Error types for the Lumen3D engine
//!
//! Three families of failure flow through this type:
//! - configuration errors, returned synchronously and recoverable
//! - graphics and picking-buffer errors, which the render thread treats as fatal
//! - scene graph errors raised while resolving a pick

use std::fmt;

/// Result type for Lumen3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen3D engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Graphics device error surfaced after a draw call
    BackendError(String),

    /// A property was given a value it cannot hold (zero axis, bad stereo mode, ...)
    InvalidConfiguration(String),

    /// Scene extent beyond what the global correction factor can represent
    SceneTooLarge(f64),

    /// The selection buffer could not hold every hit record
    PickBufferOverflow {
        /// Words the driver needed
        required: usize,
        /// Words that were allocated
        capacity: usize,
    },

    /// A selection name path did not resolve to an object
    InvalidPick(String),

    /// Initialization failed (engine, display thread, context)
    InitializationFailed(String),

    /// The other end of a channel hung up
    ChannelClosed(String),
}

impl Error {
    /// Whether the render loop must stop after this error.
    ///
    /// Graphics errors leave the device in an unknown state, and a pick buffer
    /// overflow or an unrepresentable scene cannot be recovered by retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::BackendError(_) | Error::SceneTooLarge(_) | Error::PickBufferOverflow { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::SceneTooLarge(scale) => write!(
                f,
                "Cannot represent scene geometry with an extent of {:e} units",
                scale
            ),
            Error::PickBufferOverflow { required, capacity } => write!(
                f,
                "Pick buffer overflow: {} words required, {} allocated",
                required, capacity
            ),
            Error::InvalidPick(msg) => write!(f, "Invalid pick: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ChannelClosed(msg) => write!(f, "Channel closed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
