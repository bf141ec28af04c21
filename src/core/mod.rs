//! Core session types and logic.
//!
//! This module contains the pure functional core of a game session:
//! - Session state, sides and results
//! - Compact move notation and the immutable move history
//! - Guard predicates over session state
//! - The transition function and the commands it derives
//! - The projector that turns history into display data
//!
//! All logic in this module is pure (no side effects), following
//! the "pure core, imperative shell" philosophy.

mod action;
pub mod command;
mod guard;
mod history;
mod notation;
pub mod projection;
mod state;
pub mod transition;
mod violation;

pub use action::{Action, UserAction};
pub use command::Command;
pub use guard::Guard;
pub use history::MoveHistory;
pub use notation::{HalfMove, NotationError, Promotion, Square};
pub use projection::{Captures, Projection};
pub use state::{GameResult, SessionState, Side, Verdict};
pub use transition::{Disposition, Rejection, Step};
pub use violation::SubmissionViolation;
