//! Guard predicates over session state.
//!
//! Guards are pure boolean functions deciding whether something may happen
//! in a given state, such as whether the bot should be asked for a move.
//! Human submissions are checked by the accumulating policy in
//! [`enforcement`](crate::enforcement) instead, so every reason is reported.

use super::state::{Side, SessionState};
use crate::rules::RulesEngine;

/// Pure predicate over a session state and its side to move.
///
/// # Example
///
/// ```rust
/// use sparring::core::{Guard, SessionState, Side};
/// use sparring::rules::StandardChess;
///
/// let state = SessionState::initial(&StandardChess);
/// let bot_may_move = Guard::bot_turn(Side::Black);
///
/// assert!(!bot_may_move.check(&state, Side::White));
/// assert!(bot_may_move.check(&state, Side::Black));
/// ```
pub struct Guard {
    predicate: Box<dyn Fn(&SessionState, Side) -> bool + Send + Sync>,
}

impl Guard {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate receives the state and the side to move. It must be
    /// deterministic and thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&SessionState, Side) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Passes when it is `bot_side`'s turn, no bot request is outstanding
    /// and the game is not over.
    pub fn bot_turn(bot_side: Side) -> Self {
        Self::new(move |state, turn_owner| {
            turn_owner == bot_side && !state.bot_thinking && !state.is_final()
        })
    }

    /// Check the guard with an already known side to move.
    pub fn check(&self, state: &SessionState, turn_owner: Side) -> bool {
        (self.predicate)(state, turn_owner)
    }

    /// Check the guard, asking `rules` for the side to move.
    ///
    /// A position the rules engine cannot read never passes.
    pub fn check_with<R: RulesEngine + ?Sized>(&self, rules: &R, state: &SessionState) -> bool {
        state
            .turn_owner(rules)
            .map(|turn_owner| self.check(state, turn_owner))
            .unwrap_or(false)
    }
}
