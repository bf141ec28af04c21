//! Derived-state projector.
//!
//! Display data (notation per move, captured pieces) is never stored in the
//! session; it is recomputed from the move history on demand.

use super::history::MoveHistory;
use super::state::Side;
use crate::rules::{PieceKind, Position, RulesEngine, RulesError};
use serde::Serialize;

/// Pieces captured, partitioned by the side that captured them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Captures {
    pub by_white: Vec<PieceKind>,
    pub by_black: Vec<PieceKind>,
}

impl Captures {
    pub fn by(&self, side: Side) -> &[PieceKind] {
        match side {
            Side::White => &self.by_white,
            Side::Black => &self.by_black,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_white.is_empty() && self.by_black.is_empty()
    }
}

/// Display-ready view of a move history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    /// Human-readable notation, one entry per half-move.
    pub notation: Vec<String>,
    pub captures: Captures,
}

impl Projection {
    /// Numbered move pairs: `"1. e4 e5"`, `"2. Nf3"`.
    pub fn move_pairs(&self) -> Vec<String> {
        self.notation
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect()
    }
}

/// Replay `history` from `initial` and collect notation and captures.
///
/// # Example
///
/// ```rust
/// use sparring::core::{projection, MoveHistory};
/// use sparring::rules::{RulesEngine, StandardChess};
///
/// let history: MoveHistory = ["e2e4", "d7d5", "e4d5"]
///     .into_iter()
///     .map(|m| m.parse().unwrap())
///     .collect();
/// let view = projection::project(&StandardChess, &StandardChess.initial_position(), &history).unwrap();
///
/// assert_eq!(view.notation, vec!["e4", "d5", "exd5"]);
/// assert_eq!(view.captures.by_white.len(), 1);
/// ```
pub fn project<R: RulesEngine + ?Sized>(
    rules: &R,
    initial: &Position,
    history: &MoveHistory,
) -> Result<Projection, RulesError> {
    let mut position = initial.clone();
    let mut projection = Projection::default();

    for half_move in history.moves() {
        let (next, meta) = rules.apply_move(&position, half_move)?;
        projection.notation.push(meta.notation);
        if let Some(captured) = meta.captured {
            match meta.mover {
                Side::White => projection.captures.by_white.push(captured),
                Side::Black => projection.captures.by_black.push(captured),
            }
        }
        position = next;
    }

    Ok(projection)
}
