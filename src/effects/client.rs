//! Remote collaborators: the bot service and game persistence.

use crate::core::Verdict;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from a remote call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("Transport failed: {0}")]
    Transport(String),

    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Request body for a bot move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BotMoveRequest {
    /// Position to move from, as FEN.
    pub fen: String,
}

/// The bot's answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BotMove {
    /// Compact notation, 4-5 characters.
    #[serde(rename = "move")]
    pub mv: String,
    pub evaluation: f64,
}

/// A finished game as sent to the persistence service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: Uuid,
    pub moves: Vec<String>,
    pub result: Verdict,
    /// Final position, as FEN.
    pub fen: String,
    pub finished_at: DateTime<Utc>,
}

/// Suggests moves for the automated opponent.
///
/// The implementation owns transport, retries and timeouts of its own; the
/// session only relies on the call eventually resolving or failing.
#[async_trait]
pub trait BotClient: Send + Sync {
    async fn request_move(&self, request: BotMoveRequest) -> Result<BotMove, ClientError>;
}

/// Stores finished games.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn save_game(&self, record: &GameRecord) -> Result<(), ClientError>;
}
