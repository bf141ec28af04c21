//! Checkpoint error types.

use crate::core::GameResult;
use thiserror::Error;

/// Errors that can occur saving or resuming a session
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Cannot encode checkpoint: {0}")]
    Encode(String),

    #[error("Cannot decode checkpoint: {0}")]
    Decode(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A recorded move does not replay from the position before it.
    #[error("Move {ply} ({notation}) cannot be replayed: {reason}")]
    IllegalHistory {
        ply: usize,
        notation: String,
        reason: String,
    },

    #[error("Checkpoint says {} but the replayed position says {}", .stored.name(), .derived.name())]
    ResultMismatch {
        stored: GameResult,
        derived: GameResult,
    },

    #[error("Rules engine failed: {0}")]
    Engine(String),
}
