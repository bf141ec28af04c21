//! Validation-based enforcement at the interface boundary.
//!
//! The transition function already rejects moves that are illegal or arrive
//! after the game is over. A user interface must additionally refuse a move
//! while the bot is thinking or when it is not the human's turn, so that a
//! human submission can never race an outstanding bot request.
//!
//! Checks use Stillwater's `Validation` type to accumulate ALL violations
//! instead of stopping at the first one.
//!
//! # Example
//!
//! ```rust
//! use sparring::core::{GameResult, Side};
//! use sparring::enforcement::{SubmissionContext, SubmissionPolicy, SubmissionViolation};
//!
//! let policy = SubmissionPolicy::standard();
//! let ctx = SubmissionContext {
//!     human_side: Side::White,
//!     turn_owner: Side::Black,
//!     bot_thinking: true,
//!     result: GameResult::InProgress,
//!     notation: "e2e4".to_string(),
//! };
//!
//! assert_eq!(policy.violations(&ctx).len(), 2);
//! ```

pub mod context;
pub mod rules;

// Re-export commonly used types
pub use context::SubmissionContext;
pub use rules::SubmissionPolicy;
pub use crate::core::SubmissionViolation;
