//! Builder for constructing sessions.

use crate::builder::error::BuildError;
use crate::checkpoint::SessionCheckpoint;
use crate::config::SessionConfig;
use crate::core::{SessionState, Side};
use crate::effects::session::Parts;
use crate::effects::{BotClient, PersistenceClient, Session};
use crate::enforcement::SubmissionPolicy;
use crate::rules::RulesEngine;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// Builder for a [`Session`] with a fluent API.
///
/// Building starts the session: when the bot plays the side to move, its
/// first request is issued immediately, so `build` must run inside a tokio
/// runtime.
pub struct SessionBuilder<R: RulesEngine + 'static> {
    rules: Option<R>,
    bot: Option<Arc<dyn BotClient>>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    config: SessionConfig,
    human_side: Option<Side>,
    extra_checks: SubmissionPolicy,
    checkpoint: Option<SessionCheckpoint>,
}

impl<R: RulesEngine + 'static> SessionBuilder<R> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            rules: None,
            bot: None,
            persistence: None,
            config: SessionConfig::default(),
            human_side: None,
            extra_checks: SubmissionPolicy::permissive(),
            checkpoint: None,
        }
    }

    /// Set the rules engine (required).
    pub fn rules(mut self, rules: R) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the bot service (required).
    pub fn bot_client(mut self, client: Arc<dyn BotClient>) -> Self {
        self.bot = Some(client);
        self
    }

    /// Set the game store (required).
    pub fn persistence(mut self, client: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(client);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the side from the config.
    pub fn human_side(mut self, side: Side) -> Self {
        self.human_side = Some(side);
        self
    }

    /// Checks run on human submissions in addition to the standard ones.
    ///
    /// The standard checks (bot thinking, not the human's turn, game over)
    /// always run first and cannot be removed.
    pub fn extra_checks(mut self, checks: SubmissionPolicy) -> Self {
        self.extra_checks = checks;
        self
    }

    /// Resume a saved game. The checkpoint's side takes precedence.
    pub fn resume_from(mut self, checkpoint: SessionCheckpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Build and start the session.
    pub fn build(self) -> Result<Session<R>, BuildError> {
        let rules = self.rules.ok_or(BuildError::MissingRules)?;
        let bot = self.bot.ok_or(BuildError::MissingBotClient)?;
        let persistence = self.persistence.ok_or(BuildError::MissingPersistence)?;
        let runtime = Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let mut config = self.config;
        if let Some(side) = self.human_side {
            config.human_side = side;
        }

        let state = match &self.checkpoint {
            Some(checkpoint) => {
                let state = checkpoint.restore(&rules)?;
                config.human_side = checkpoint.human_side;
                info!(
                    checkpoint = %checkpoint.id,
                    plies = state.history.len(),
                    "Resuming session"
                );
                state
            }
            None => SessionState::initial(&rules),
        };

        Ok(Session::start(Parts {
            rules,
            config,
            policy: SubmissionPolicy::standard().combine(self.extra_checks),
            bot,
            persistence,
            state,
            runtime,
        }))
    }
}

impl<R: RulesEngine + 'static> Default for SessionBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}
