//! Context provided to submission checks.

use crate::core::{GameResult, SessionState, Side};
use crate::rules::{RulesEngine, RulesError};

/// What a submission check may look at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionContext {
    pub human_side: Side,
    pub turn_owner: Side,
    pub bot_thinking: bool,
    pub result: GameResult,
    pub notation: String,
}

impl SubmissionContext {
    /// Build the context for submitting `notation` in `state`.
    pub fn new<R: RulesEngine + ?Sized>(
        rules: &R,
        state: &SessionState,
        human_side: Side,
        notation: &str,
    ) -> Result<Self, RulesError> {
        Ok(Self {
            human_side,
            turn_owner: state.turn_owner(rules)?,
            bot_thinking: state.bot_thinking,
            result: state.result,
            notation: notation.to_string(),
        })
    }
}
