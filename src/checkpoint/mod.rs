//! Checkpoint and resume for game sessions.
//!
//! A checkpoint stores only what cannot be recomputed: the move history, the
//! result and which side the human plays. Restoring replays the history
//! through the rules engine, so a checkpoint can never smuggle in a position
//! its moves do not produce.

use crate::core::{command, Action, GameResult, MoveHistory, SessionState, Side};
use crate::core::transition::{self, Disposition};
use crate::rules::RulesEngine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of a session.
/// Does NOT include the thinking flag: a restored session has no request in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Side played by the human
    pub human_side: Side,

    /// Every half-move played so far
    pub history: MoveHistory,

    /// Result at checkpoint time
    pub result: GameResult,
}

impl SessionCheckpoint {
    /// Capture `state` for a session where the human plays `human_side`.
    pub fn capture(state: &SessionState, human_side: Side) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            human_side,
            history: state.history.clone(),
            result: state.result,
        }
    }

    /// Serialize to pretty JSON (readable, diffable).
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json).map_err(|e| CheckpointError::Decode(e.to_string()))
    }

    /// Serialize to compact binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::Decode(e.to_string()))
    }

    /// Rebuild the session state by replaying the history through `rules`.
    ///
    /// Fails if the version is unknown, any move is rejected, or the stored
    /// result disagrees with the replayed position.
    pub fn restore<R: RulesEngine + ?Sized>(&self, rules: &R) -> Result<SessionState, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let mut state = SessionState::initial(rules);
        for (ply, half_move) in self.history.moves().iter().enumerate() {
            let step = transition::step(rules, &state, &Action::SubmitMove(half_move.to_string()));
            if let Disposition::Rejected(rejection) = step.disposition {
                return Err(CheckpointError::IllegalHistory {
                    ply: ply + 1,
                    notation: half_move.to_string(),
                    reason: rejection.to_string(),
                });
            }
            state = step.state;
        }

        let status = rules
            .terminal_status(&state.position)
            .map_err(|e| CheckpointError::Engine(e.to_string()))?;
        let derived = command::verdict_for(status).unwrap_or(GameResult::InProgress);
        if derived != self.result {
            return Err(CheckpointError::ResultMismatch {
                stored: self.result,
                derived,
            });
        }

        Ok(SessionState {
            result: derived,
            ..state
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StandardChess;

    fn played(moves: &[&str]) -> SessionState {
        moves.iter().fold(SessionState::initial(&StandardChess), |s, m| {
            transition::apply(&StandardChess, &s, &Action::SubmitMove(m.to_string()))
        })
    }

    #[test]
    fn json_checkpoint_restores_state() {
        let state = played(&["e2e4", "e7e5", "g1f3"]);
        let checkpoint = SessionCheckpoint::capture(&state, Side::White);

        let json = checkpoint.to_json().unwrap();
        let loaded = SessionCheckpoint::from_json(&json).unwrap();

        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.restore(&StandardChess).unwrap(), state);
    }

    #[test]
    fn binary_checkpoint_restores_state() {
        let state = played(&["d2d4", "g8f6"]);
        let checkpoint = SessionCheckpoint::capture(&state, Side::Black);

        let bytes = checkpoint.to_bytes().unwrap();
        let loaded = SessionCheckpoint::from_bytes(&bytes).unwrap();

        assert_eq!(loaded.human_side, Side::Black);
        assert_eq!(loaded.restore(&StandardChess).unwrap(), state);
    }

    #[test]
    fn restore_clears_thinking_flag() {
        let mut state = played(&["e2e4"]);
        state.bot_thinking = true;
        let restored = SessionCheckpoint::capture(&state, Side::White)
            .restore(&StandardChess)
            .unwrap();
        assert!(!restored.bot_thinking);
    }

    #[test]
    fn restore_rejects_unknown_version() {
        let mut checkpoint = SessionCheckpoint::capture(&played(&[]), Side::White);
        checkpoint.version = 99;
        assert!(matches!(
            checkpoint.restore(&StandardChess),
            Err(CheckpointError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn restore_rejects_illegal_history() {
        let mut checkpoint = SessionCheckpoint::capture(&played(&["e2e4"]), Side::White);
        checkpoint.history = checkpoint.history.record("e2e4".parse().unwrap());
        assert!(matches!(
            checkpoint.restore(&StandardChess),
            Err(CheckpointError::IllegalHistory { ply: 2, .. })
        ));
    }

    #[test]
    fn restore_rejects_inconsistent_result() {
        let mut checkpoint = SessionCheckpoint::capture(&played(&["e2e4"]), Side::White);
        checkpoint.result = GameResult::WhiteWins;
        assert!(matches!(
            checkpoint.restore(&StandardChess),
            Err(CheckpointError::ResultMismatch {
                stored: GameResult::WhiteWins,
                derived: GameResult::InProgress,
            })
        ));
    }

    #[test]
    fn finished_game_restores_with_result() {
        let state = SessionState {
            result: GameResult::BlackWins,
            ..played(&["f2f3", "e7e5", "g2g4", "d8h4"])
        };
        let restored = SessionCheckpoint::capture(&state, Side::White)
            .restore(&StandardChess)
            .unwrap();
        assert_eq!(restored.result, GameResult::BlackWins);
    }

    #[test]
    fn corrupt_json_is_a_deserialization_error() {
        assert!(matches!(
            SessionCheckpoint::from_json("{ not json"),
            Err(CheckpointError::Decode(_))
        ));
    }
}
