//! The transition function.
//!
//! `(SessionState, Action) -> SessionState`, deterministic and free of side
//! effects: no network, no clock, no randomness. All legality, turn and
//! result rules of a session live here.

use super::action::Action;
use super::notation::{HalfMove, NotationError};
use super::state::{GameResult, SessionState};
use super::violation::SubmissionViolation;
use crate::rules::RulesEngine;
use std::fmt;

/// Why an action left the state unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The game already has a final result
    GameOver(GameResult),

    /// The move string is not a well-formed half-move
    Malformed {
        notation: String,
        reason: NotationError,
    },

    /// The half-move is not legal in the current position
    Illegal(HalfMove),

    /// The rules engine failed on the current position
    Engine(String),

    /// A different final result is already set
    ResultFixed {
        current: GameResult,
        requested: GameResult,
    },

    /// The submission was refused at the interface boundary
    Policy(Vec<SubmissionViolation>),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameOver(result) => write!(f, "game is over ({})", result.name()),
            Self::Malformed { notation, reason } => {
                write!(f, "malformed move '{notation}': {reason}")
            }
            Self::Illegal(half_move) => write!(f, "illegal move {half_move}"),
            Self::Engine(reason) => write!(f, "rules engine failure: {reason}"),
            Self::ResultFixed { current, requested } => write!(
                f,
                "result already {} (requested {})",
                current.name(),
                requested.name()
            ),
            Self::Policy(violations) => {
                let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
                write!(f, "submission refused: {}", reasons.join("; "))
            }
        }
    }
}

/// Whether an action was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disposition {
    Accepted,
    Rejected(Rejection),
}

impl Disposition {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Result of applying one action: the next state and whether it was accepted.
///
/// A rejected step always carries a state equal to its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub state: SessionState,
    pub disposition: Disposition,
}

impl Step {
    fn accepted(state: SessionState) -> Self {
        Self {
            state,
            disposition: Disposition::Accepted,
        }
    }

    fn rejected(state: &SessionState, rejection: Rejection) -> Self {
        Self {
            state: state.clone(),
            disposition: Disposition::Rejected(rejection),
        }
    }
}

/// Apply `action` to `state`, returning the next state.
///
/// Rejected actions return a state equal to the input. Use [`step`] when the
/// caller needs to know whether the action was accepted.
///
/// # Example
///
/// ```rust
/// use sparring::core::{transition, Action, SessionState};
/// use sparring::rules::StandardChess;
///
/// let start = SessionState::initial(&StandardChess);
/// let next = transition::apply(&StandardChess, &start, &Action::SubmitMove("e2e4".into()));
/// assert_eq!(next.history.notations(), vec!["e2e4"]);
///
/// let same = transition::apply(&StandardChess, &start, &Action::SubmitMove("e2e5".into()));
/// assert_eq!(same, start);
/// ```
pub fn apply<R: RulesEngine + ?Sized>(
    rules: &R,
    state: &SessionState,
    action: &Action,
) -> SessionState {
    step(rules, state, action).state
}

/// Apply `action` to `state`, reporting acceptance explicitly.
pub fn step<R: RulesEngine + ?Sized>(rules: &R, state: &SessionState, action: &Action) -> Step {
    match action {
        Action::SubmitMove(notation) => submit_move(rules, state, notation),
        Action::BotThinkingStarted => Step::accepted(SessionState {
            bot_thinking: true,
            ..state.clone()
        }),
        Action::BotThinkingEnded => Step::accepted(SessionState {
            bot_thinking: false,
            ..state.clone()
        }),
        Action::SetResult(requested) => set_result(state, *requested),
        Action::Reset => Step::accepted(SessionState::initial(rules)),
    }
}

fn submit_move<R: RulesEngine + ?Sized>(rules: &R, state: &SessionState, notation: &str) -> Step {
    if state.is_final() {
        return Step::rejected(state, Rejection::GameOver(state.result));
    }

    let half_move: HalfMove = match notation.parse() {
        Ok(half_move) => half_move,
        Err(reason) => {
            return Step::rejected(
                state,
                Rejection::Malformed {
                    notation: notation.to_string(),
                    reason,
                },
            )
        }
    };

    match rules.is_legal(&state.position, &half_move) {
        Ok(true) => {}
        Ok(false) => return Step::rejected(state, Rejection::Illegal(half_move)),
        Err(e) => return Step::rejected(state, Rejection::Engine(e.to_string())),
    }

    match rules.apply_move(&state.position, &half_move) {
        Ok((position, _meta)) => Step::accepted(SessionState {
            position,
            history: state.history.record(half_move),
            ..state.clone()
        }),
        Err(e) => Step::rejected(state, Rejection::Engine(e.to_string())),
    }
}

fn set_result(state: &SessionState, requested: GameResult) -> Step {
    if state.result == requested {
        return Step::accepted(state.clone());
    }
    if state.is_final() {
        return Step::rejected(
            state,
            Rejection::ResultFixed {
                current: state.result,
                requested,
            },
        );
    }
    Step::accepted(SessionState {
        result: requested,
        ..state.clone()
    })
}
