//! Reasons a move submission is refused before it reaches the transition
//! function. They live in the core so a rejection can carry them.

use super::state::{GameResult, Side};
use thiserror::Error;

/// Reasons a user interface must refuse a move submission
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionViolation {
    #[error("The bot is thinking")]
    BotThinking,

    #[error("It is {turn_owner}'s turn")]
    NotYourTurn { turn_owner: Side },

    #[error("The game is over ({})", .result.name())]
    GameOver { result: GameResult },

    #[error("Custom check failed: {message}")]
    CustomCheckFailed { message: String },
}
