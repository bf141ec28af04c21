//! Move history tracking.
//!
//! Provides an immutable, append-only record of the half-moves played in a
//! session, following functional programming principles.

use super::notation::HalfMove;
use crate::rules::{Position, RulesEngine, RulesError};
use serde::{Deserialize, Serialize};

/// Ordered half-moves of a session, in compact notation.
///
/// History is immutable - the `record` method returns a new history
/// with the move appended.
///
/// # Example
///
/// ```rust
/// use sparring::core::MoveHistory;
///
/// let history = MoveHistory::new();
/// let history = history.record("e2e4".parse().unwrap());
/// let history = history.record("e7e5".parse().unwrap());
///
/// assert_eq!(history.notations(), vec!["e2e4", "e7e5"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveHistory {
    moves: Vec<HalfMove>,
}

impl MoveHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self { moves: Vec::new() }
    }

    /// Record a half-move, returning a new history.
    ///
    /// This is a pure function - it does not mutate the existing history
    /// but returns a new one with the move added.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sparring::core::MoveHistory;
    ///
    /// let history = MoveHistory::new();
    /// let next = history.record("d2d4".parse().unwrap());
    /// assert_eq!(next.len(), 1);
    /// assert_eq!(history.len(), 0); // Original unchanged
    /// ```
    pub fn record(&self, half_move: HalfMove) -> Self {
        let mut moves = self.moves.clone();
        moves.push(half_move);
        Self { moves }
    }

    pub fn moves(&self) -> &[HalfMove] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn last(&self) -> Option<&HalfMove> {
        self.moves.last()
    }

    /// Moves as notation strings, in play order.
    pub fn notations(&self) -> Vec<String> {
        self.moves.iter().map(ToString::to_string).collect()
    }

    /// Fold the history through `rules`, starting from `initial`.
    ///
    /// For a history built by accepted transitions this reproduces the
    /// session's position exactly.
    pub fn replay<R: RulesEngine + ?Sized>(
        &self,
        rules: &R,
        initial: &Position,
    ) -> Result<Position, RulesError> {
        self.moves
            .iter()
            .try_fold(initial.clone(), |position, half_move| {
                rules
                    .apply_move(&position, half_move)
                    .map(|(next, _)| next)
            })
    }
}

impl FromIterator<HalfMove> for MoveHistory {
    fn from_iter<I: IntoIterator<Item = HalfMove>>(iter: I) -> Self {
        Self {
            moves: iter.into_iter().collect(),
        }
    }
}
