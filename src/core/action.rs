//! Actions accepted by the transition function.

use super::state::GameResult;
use serde::{Deserialize, Serialize};

/// Every input the transition function understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Play a half-move given in compact notation (`"e2e4"`, `"e7e8q"`).
    SubmitMove(String),
    BotThinkingStarted,
    BotThinkingEnded,
    SetResult(GameResult),
    Reset,
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Self::SubmitMove(_) => "SubmitMove",
            Self::BotThinkingStarted => "BotThinkingStarted",
            Self::BotThinkingEnded => "BotThinkingEnded",
            Self::SetResult(_) => "SetResult",
            Self::Reset => "Reset",
        }
    }
}

/// The subset of actions a user interface may dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    SubmitMove(String),
    Reset,
}

impl From<UserAction> for Action {
    fn from(value: UserAction) -> Self {
        match value {
            UserAction::SubmitMove(notation) => Action::SubmitMove(notation),
            UserAction::Reset => Action::Reset,
        }
    }
}
