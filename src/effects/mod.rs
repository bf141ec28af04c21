//! The imperative shell around the pure core.
//!
//! This module owns everything that waits or talks to the outside world:
//! the bot service, game persistence and the [`Session`] that drives one game
//! by feeding actions through the transition function and carrying out the
//! commands it derives.
//!
//! # Concurrency
//!
//! - Transitions happen under a single lock, one at a time
//! - Bot requests and persistence run on background tokio tasks
//! - A bot answer is applied only if its session generation and position
//!   still match; anything else is discarded

mod client;
mod http;
pub mod session;

pub use client::{BotClient, BotMove, BotMoveRequest, ClientError, GameRecord, PersistenceClient};
pub use http::HttpApiClient;
pub use session::Session;
