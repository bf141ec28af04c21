//! Rules engine contract.
//!
//! The session core never interprets a board itself. Everything it needs to
//! know about a position (legal moves, the result of playing a move, whether
//! play is over) comes through the [`RulesEngine`] trait, which works on
//! positions as plain values: no engine instance carries mutable game state
//! between calls.

mod error;
mod standard;

pub use error::RulesError;
pub use standard::StandardChess;

use crate::core::{HalfMove, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque board position, encoded as FEN.
///
/// Only a [`RulesEngine`] interprets the contents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    pub fn new(fen: impl Into<String>) -> Self {
        Self(fen.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of chess piece, used for capture reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lower-case letter for the piece (`p`, `n`, `b`, `r`, `q`, `k`).
    pub fn char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }
}

/// A legal move together with the facts the session cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegalMove {
    pub half_move: HalfMove,
    pub is_capture: bool,
    pub mover: Side,
}

/// Metadata produced when a move is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveMeta {
    pub mover: Side,
    pub captured: Option<PieceKind>,
    /// Human-readable notation relative to the position the move was played from.
    pub notation: String,
}

/// Terminal status of a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalStatus {
    InProgress,
    Checkmate { winner: Side },
    Draw,
}

impl TerminalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Pure rules of the game, operating on position values.
///
/// Implementations must be deterministic: the same inputs always give the
/// same outputs.
pub trait RulesEngine: Send + Sync {
    /// The position every new session starts from.
    fn initial_position(&self) -> Position;

    /// Side to move in `position`.
    fn side_to_move(&self, position: &Position) -> Result<Side, RulesError>;

    /// All legal moves in `position`.
    fn legal_moves(&self, position: &Position) -> Result<Vec<LegalMove>, RulesError>;

    /// Play `half_move` from `position`, returning the new position.
    fn apply_move(
        &self,
        position: &Position,
        half_move: &HalfMove,
    ) -> Result<(Position, MoveMeta), RulesError>;

    /// Whether play is over in `position`.
    fn terminal_status(&self, position: &Position) -> Result<TerminalStatus, RulesError>;

    /// Check whether `half_move` is among the legal moves of `position`.
    fn is_legal(&self, position: &Position, half_move: &HalfMove) -> Result<bool, RulesError> {
        Ok(self
            .legal_moves(position)?
            .iter()
            .any(|m| m.half_move == *half_move))
    }
}
