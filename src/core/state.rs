//! Session state: the canonical record of one game's progress.
//!
//! A `SessionState` is a value. Every accepted transition produces a new one;
//! nothing mutates a state in place.

use super::history::MoveHistory;
use crate::rules::{Position, RulesEngine, RulesError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two players. White is side 1 and moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

/// Outcome of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    #[default]
    InProgress,
    /// Side 1 wins.
    WhiteWins,
    /// Side 2 wins.
    BlackWins,
    Draw,
}

impl GameResult {
    /// Result for a game won by `side`.
    pub fn win_for(side: Side) -> Self {
        match side {
            Side::White => Self::WhiteWins,
            Side::Black => Self::BlackWins,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::InProgress => "InProgress",
            Self::WhiteWins => "WhiteWins",
            Self::BlackWins => "BlackWins",
            Self::Draw => "Draw",
        }
    }

    /// Final results freeze the session until reset.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// The persisted form of a final result.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::InProgress => None,
            Self::WhiteWins => Some(Verdict::White),
            Self::BlackWins => Some(Verdict::Black),
            Self::Draw => Some(Verdict::Draw),
        }
    }
}

/// Final result as stored by the persistence service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    White,
    Black,
    Draw,
}

impl From<Verdict> for GameResult {
    fn from(value: Verdict) -> Self {
        match value {
            Verdict::White => GameResult::WhiteWins,
            Verdict::Black => GameResult::BlackWins,
            Verdict::Draw => GameResult::Draw,
        }
    }
}

/// Canonical state of one game.
///
/// The move history is the source of truth; `position` is its fold through
/// the rules engine, kept alongside so readers do not have to replay.
/// The side to move is never stored; ask [`SessionState::turn_owner`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub position: Position,
    pub history: MoveHistory,
    pub bot_thinking: bool,
    pub result: GameResult,
}

impl SessionState {
    /// Fresh state: initial position, empty history, game in progress.
    pub fn initial<R: RulesEngine + ?Sized>(rules: &R) -> Self {
        Self {
            position: rules.initial_position(),
            history: MoveHistory::new(),
            bot_thinking: false,
            result: GameResult::InProgress,
        }
    }

    /// Side to move, as implied by the position.
    pub fn turn_owner<R: RulesEngine + ?Sized>(&self, rules: &R) -> Result<Side, RulesError> {
        rules.side_to_move(&self.position)
    }

    pub fn is_final(&self) -> bool {
        self.result.is_final()
    }
}
