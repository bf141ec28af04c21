//! Errors from assembling a session.

use crate::checkpoint::CheckpointError;
use thiserror::Error;

/// Errors that can occur when building a session.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Rules engine not specified. Call .rules(engine) before .build()")]
    MissingRules,

    #[error("Bot client not specified. Call .bot_client(client) before .build()")]
    MissingBotClient,

    #[error("Persistence client not specified. Call .persistence(client) before .build()")]
    MissingPersistence,

    #[error("No tokio runtime available; build the session from within a runtime")]
    NoRuntime,

    #[error("Cannot resume from checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),
}
