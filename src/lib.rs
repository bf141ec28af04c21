//! Sparring: a chess session between one human and a remote bot.
//!
//! Sparring is built on Stillwater's "pure core, imperative shell" philosophy.
//! Every change to a game goes through one pure transition function, and the
//! follow-up work it implies (ask the bot, declare a result, store the game)
//! is derived as a list of commands instead of being performed in place. The
//! [`Session`](effects::Session) is the thin shell that carries those
//! commands out.
//!
//! # Core Concepts
//!
//! - **State**: position, move history, bot-thinking flag and result
//! - **Transitions**: `(state, action) -> state`, rejecting anything illegal
//! - **Commands**: effects derived from each transition, edge-activated
//! - **Rules**: a pluggable [`RulesEngine`](rules::RulesEngine), with
//!   standard chess provided
//!
//! # Example
//!
//! ```rust
//! use sparring::core::{transition, Action, SessionState};
//! use sparring::rules::StandardChess;
//!
//! let state = SessionState::initial(&StandardChess);
//! let state = transition::apply(&StandardChess, &state, &Action::SubmitMove("e2e4".into()));
//!
//! assert_eq!(state.history.notations(), vec!["e2e4"]);
//! assert_eq!(
//!     state.position.as_str(),
//!     "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
//! );
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod effects;
pub mod enforcement;
pub mod rules;

// Re-export commonly used types
pub use crate::builder::SessionBuilder;
pub use crate::config::SessionConfig;
pub use crate::core::{Action, GameResult, SessionState, Side, UserAction};
pub use crate::effects::Session;
pub use crate::rules::{RulesEngine, StandardChess};
