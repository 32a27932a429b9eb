//! Error types for the board model and action scheduler.

use thiserror::Error;

use crate::actions::ActionId;

/// Result type alias using [`BoardError`].
pub type Result<T> = std::result::Result<T, BoardError>;

/// Top-level error type for board construction and mutation.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Board dimensions must be positive and fit the heightfield.
    #[error("Invalid board dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width in tiles.
        width: i32,
        /// Requested height in tiles.
        height: i32,
    },

    /// The playable border leaves no playable tiles.
    #[error("Border of {border} tiles leaves no playable area on a {width}x{height} board")]
    InvalidBorder {
        /// Requested border in tiles.
        border: i32,
        /// Board width in tiles.
        width: i32,
        /// Board height in tiles.
        height: i32,
    },

    /// Heightfield coordinates outside the board.
    #[error("Heightfield coordinates out of range: ({x}, {y})")]
    VertexOutOfRange {
        /// Sub-tile x coordinate.
        x: i32,
        /// Sub-tile y coordinate.
        y: i32,
    },

    /// Light index beyond [`crate::environment::NUM_LIGHTS`].
    #[error("Invalid light index: {0}")]
    InvalidLight(usize),

    /// Unknown terrain code in board data.
    #[error("Unknown terrain code: {0}")]
    UnknownTerrain(u8),

    /// Configuration file or string could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}

/// Errors reported by the action scheduler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// The action is not currently executing: it was completed twice, never
    /// dispatched, or discarded by a round teardown.
    #[error("Action {0} is not executing (re-completed?)")]
    NotExecuting(ActionId),
}

/// Failure raised by an action payload while executing.
///
/// The scheduler contains these: the action is logged and treated as
/// completed so the queue never stalls.
#[derive(Debug, Error)]
#[error("Board action failed: {message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    /// Create an action error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
