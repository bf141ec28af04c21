//! Submission policy using Validation.

use crate::enforcement::context::SubmissionContext;
use crate::core::SubmissionViolation;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Type alias for validation check functions
pub type SubmissionCheck =
    Box<dyn Fn(&SubmissionContext) -> Validation<(), NonEmptyVec<SubmissionViolation>> + Send + Sync>;

/// Checks applied to a human move before it reaches the transition function.
/// Uses Validation to accumulate ALL violations.
pub struct SubmissionPolicy {
    required_checks: Vec<SubmissionCheck>,
}

impl SubmissionPolicy {
    /// The standard policy: no submission while the bot is thinking, while it
    /// is not the human's turn, or after the game is over.
    pub fn standard() -> Self {
        Self::permissive()
            .require(|ctx| {
                if ctx.bot_thinking {
                    Validation::fail(SubmissionViolation::BotThinking)
                } else {
                    Validation::success(())
                }
            })
            .require(|ctx| {
                if ctx.turn_owner != ctx.human_side {
                    Validation::fail(SubmissionViolation::NotYourTurn {
                        turn_owner: ctx.turn_owner,
                    })
                } else {
                    Validation::success(())
                }
            })
            .require(|ctx| {
                if ctx.result.is_final() {
                    Validation::fail(SubmissionViolation::GameOver { result: ctx.result })
                } else {
                    Validation::success(())
                }
            })
    }

    /// A policy with no checks at all.
    pub fn permissive() -> Self {
        Self {
            required_checks: Vec::new(),
        }
    }

    /// Add a custom validation check
    pub fn require<F>(mut self, check: F) -> Self
    where
        F: Fn(&SubmissionContext) -> Validation<(), NonEmptyVec<SubmissionViolation>>
            + Send
            + Sync
            + 'static,
    {
        self.required_checks.push(Box::new(check));
        self
    }

    /// Add a simple predicate check with error message
    pub fn require_pred<F>(mut self, predicate: F, error_msg: String) -> Self
    where
        F: Fn(&SubmissionContext) -> bool + Send + Sync + 'static,
    {
        let check = move |ctx: &SubmissionContext| {
            if predicate(ctx) {
                Validation::success(())
            } else {
                Validation::fail(SubmissionViolation::CustomCheckFailed {
                    message: error_msg.clone(),
                })
            }
        };
        self.required_checks.push(Box::new(check));
        self
    }

    /// Append the checks of `other` after this policy's own.
    pub fn combine(mut self, other: SubmissionPolicy) -> Self {
        self.required_checks.extend(other.required_checks);
        self
    }

    /// Run every check, accumulating ALL violations.
    /// Returns Validation::Success(()) if all checks pass.
    pub fn enforce(
        &self,
        context: &SubmissionContext,
    ) -> Validation<(), NonEmptyVec<SubmissionViolation>> {
        let checks: Vec<Validation<(), NonEmptyVec<SubmissionViolation>>> = self
            .required_checks
            .iter()
            .map(|check_fn| check_fn(context))
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }

    /// Like [`enforce`](Self::enforce), flattened into a list (empty when allowed).
    pub fn violations(&self, context: &SubmissionContext) -> Vec<SubmissionViolation> {
        match self.enforce(context) {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
