//! Rules engine error types.

use thiserror::Error;

/// Errors raised by a rules engine for a single operation.
///
/// These never terminate a session: the transition function and the
/// orchestrator convert them into rejections.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RulesError {
    /// The position value could not be interpreted
    #[error("Invalid position '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },

    /// The move is well-formed but not legal in the position
    #[error("Illegal move {notation} in position '{fen}'")]
    IllegalMove { notation: String, fen: String },
}
