//! The orchestrator: one owned game session and its asynchronous bot turns.
//!
//! All state changes go through the pure transition function while holding
//! the session lock, so no reader ever sees a half-applied transition. The
//! commands derived from each transition are resolved inside the same
//! critical section where they are state changes (declaring a result,
//! claiming the bot turn) and handed to background tasks where they are I/O
//! (asking the bot for a move, storing a finished game).

use super::client::{BotClient, BotMove, BotMoveRequest, ClientError, GameRecord, PersistenceClient};
use crate::checkpoint::SessionCheckpoint;
use crate::config::SessionConfig;
use crate::core::transition::{self, Disposition, Rejection};
use crate::core::{
    command, projection, Action, Command, GameResult, Guard, HalfMove, Projection, SessionState,
    Side, UserAction,
};
use crate::enforcement::{SubmissionContext, SubmissionPolicy};
use crate::rules::{Position, RulesEngine, RulesError};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Mutable part of a session, only ever touched under the lock.
struct Cell {
    state: SessionState,
    /// Incremented on every reset; stale bot responses carry an older value.
    generation: u64,
}

/// An outstanding bot request, tagged so a late answer can be recognised.
#[derive(Clone, Debug)]
struct BotTicket {
    generation: u64,
    position: Position,
}

impl BotTicket {
    fn is_live(&self, cell: &Cell) -> bool {
        cell.generation == self.generation
            && cell.state.position == self.position
            && cell.state.bot_thinking
    }
}

/// I/O that must run outside the lock.
enum Job {
    FetchBotMove(BotTicket),
    Persist(GameRecord),
}

pub(crate) struct Parts<R> {
    pub rules: R,
    pub config: SessionConfig,
    pub policy: SubmissionPolicy,
    pub bot: Arc<dyn BotClient>,
    pub persistence: Arc<dyn PersistenceClient>,
    pub state: SessionState,
    pub runtime: Handle,
}

struct Inner<R> {
    rules: R,
    config: SessionConfig,
    policy: SubmissionPolicy,
    bot: Arc<dyn BotClient>,
    persistence: Arc<dyn PersistenceClient>,
    runtime: Handle,
    cell: Mutex<Cell>,
    updates: watch::Sender<SessionState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// A game between one human and the bot.
///
/// Cheap to clone; clones share the same session. Build one with
/// [`SessionBuilder`](crate::builder::SessionBuilder).
pub struct Session<R: RulesEngine + 'static> {
    inner: Arc<Inner<R>>,
}

impl<R: RulesEngine + 'static> Clone for Session<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RulesEngine + 'static> Session<R> {
    pub(crate) fn start(parts: Parts<R>) -> Self {
        let (updates, _) = watch::channel(parts.state.clone());
        let session = Self {
            inner: Arc::new(Inner {
                rules: parts.rules,
                config: parts.config,
                policy: parts.policy,
                bot: parts.bot,
                persistence: parts.persistence,
                runtime: parts.runtime,
                cell: Mutex::new(Cell {
                    state: parts.state,
                    generation: 0,
                }),
                updates,
                tasks: Mutex::new(Vec::new()),
            }),
        };

        let jobs = {
            let mut cell = session.lock();
            if cell.state.is_final() {
                Vec::new()
            } else {
                let jobs = session.follow_up(&mut cell, None);
                session.publish(&cell);
                jobs
            }
        };
        session.spawn_jobs(jobs);
        session
    }

    /// Current state (read-only copy).
    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Receive every new state as it is installed.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.updates.subscribe()
    }

    /// Result of the current game.
    pub fn result(&self) -> GameResult {
        self.lock().state.result
    }

    /// Number of resets so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn human_side(&self) -> Side {
        self.inner.config.human_side
    }

    pub fn bot_side(&self) -> Side {
        self.inner.config.human_side.opponent()
    }

    pub fn rules(&self) -> &R {
        &self.inner.rules
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Notation and captures for the current history.
    pub fn projection(&self) -> Result<Projection, RulesError> {
        let state = self.snapshot();
        projection::project(
            &self.inner.rules,
            &self.inner.rules.initial_position(),
            &state.history,
        )
    }

    /// Serializable snapshot for resuming later.
    pub fn checkpoint(&self) -> SessionCheckpoint {
        SessionCheckpoint::capture(&self.snapshot(), self.human_side())
    }

    /// Apply a user action.
    ///
    /// Move submissions are refused while the bot is thinking, when it is not
    /// the human's turn, or once the game is over; otherwise they go through
    /// the transition function. Rejection never changes the state.
    #[instrument(skip(self), fields(human = %self.human_side()))]
    pub fn dispatch(&self, action: UserAction) -> Disposition {
        let (disposition, jobs) = {
            let mut cell = self.lock();
            match action {
                UserAction::Reset => {
                    cell.generation += 1;
                    info!(generation = cell.generation, "Session reset");
                    self.transact(&mut cell, &Action::Reset, true)
                }
                UserAction::SubmitMove(notation) => {
                    if let Some(rejection) = self.refuse(&cell.state, &notation) {
                        debug!(%notation, %rejection, "Submission refused");
                        return Disposition::Rejected(rejection);
                    }
                    self.transact(&mut cell, &Action::SubmitMove(notation), false)
                }
            }
        };

        self.spawn_jobs(jobs);
        disposition
    }

    /// Re-evaluate the bot trigger against the current state.
    ///
    /// The trigger normally fires only when the position changes, so a
    /// failed bot request leaves the session waiting; this is the explicit
    /// way to try again. Returns whether a request was issued.
    pub fn recheck(&self) -> bool {
        let jobs = {
            let mut cell = self.lock();
            match self.claim(&mut cell) {
                Some(ticket) => {
                    self.publish(&cell);
                    vec![Job::FetchBotMove(ticket)]
                }
                None => Vec::new(),
            }
        };

        let triggered = !jobs.is_empty();
        self.spawn_jobs(jobs);
        triggered
    }

    /// Wait for every background task spawned so far, including tasks those
    /// tasks spawn in turn.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.tasks());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Session task ended abnormally");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cell> {
        self.inner.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, cell: &Cell) {
        self.inner.updates.send_replace(cell.state.clone());
    }

    fn refuse(&self, state: &SessionState, notation: &str) -> Option<Rejection> {
        let context =
            match SubmissionContext::new(&self.inner.rules, state, self.human_side(), notation) {
                Ok(context) => context,
                Err(e) => return Some(Rejection::Engine(e.to_string())),
            };
        let violations = self.inner.policy.violations(&context);
        (!violations.is_empty()).then_some(Rejection::Policy(violations))
    }

    /// Apply one action and resolve its commands. `fresh` marks a state that
    /// was just entered from scratch (start or reset).
    fn transact(&self, cell: &mut Cell, action: &Action, fresh: bool) -> (Disposition, Vec<Job>) {
        let before = cell.state.clone();
        let step = transition::step(&self.inner.rules, &before, action);
        if !step.disposition.is_accepted() {
            return (step.disposition, Vec::new());
        }

        debug!(action = action.name(), plies = step.state.history.len(), "Transition accepted");
        cell.state = step.state;
        let jobs = self.follow_up(cell, (!fresh).then_some(before));
        self.publish(cell);
        (Disposition::Accepted, jobs)
    }

    /// Resolve the commands derived from `prev -> cell.state`, folding result
    /// declarations back into the state until nothing but I/O remains.
    fn follow_up(&self, cell: &mut Cell, prev: Option<SessionState>) -> Vec<Job> {
        let rules = &self.inner.rules;
        let mut prev = prev;
        let mut jobs = Vec::new();

        loop {
            let mut declared = None;
            for cmd in command::commands(rules, self.bot_side(), prev.as_ref(), &cell.state) {
                match cmd {
                    Command::DeclareResult(result) => declared = Some(result),
                    Command::RequestBotMove { .. } => {
                        if let Some(ticket) = self.claim(cell) {
                            jobs.push(Job::FetchBotMove(ticket));
                        }
                    }
                    Command::PersistGame {
                        moves,
                        result,
                        final_position,
                    } => {
                        if let Some(verdict) = result.verdict() {
                            jobs.push(Job::Persist(GameRecord {
                                id: Uuid::new_v4(),
                                moves,
                                result: verdict,
                                fen: final_position.to_string(),
                                finished_at: Utc::now(),
                            }));
                        }
                    }
                }
            }

            let Some(result) = declared else {
                break;
            };
            info!(result = result.name(), "Game over");
            let before = cell.state.clone();
            cell.state = transition::apply(rules, &before, &Action::SetResult(result));
            prev = Some(before);
        }

        jobs
    }

    /// Check-and-set of the thinking flag; both happen under the lock.
    fn claim(&self, cell: &mut Cell) -> Option<BotTicket> {
        let rules = &self.inner.rules;
        if !Guard::bot_turn(self.bot_side()).check_with(rules, &cell.state) {
            return None;
        }
        cell.state = transition::apply(rules, &cell.state, &Action::BotThinkingStarted);
        Some(BotTicket {
            generation: cell.generation,
            position: cell.state.position.clone(),
        })
    }

    fn spawn_jobs(&self, jobs: Vec<Job>) {
        if jobs.is_empty() {
            return;
        }
        let mut tasks = self.tasks();
        tasks.retain(|handle| !handle.is_finished());
        for job in jobs {
            let session = self.clone();
            let handle = match job {
                Job::FetchBotMove(ticket) => self
                    .inner
                    .runtime
                    .spawn(async move { session.bot_turn(ticket).await }),
                Job::Persist(record) => self
                    .inner
                    .runtime
                    .spawn(async move { session.persist(record).await }),
            };
            tasks.push(handle);
        }
    }

    #[instrument(skip(self, ticket), fields(generation = ticket.generation))]
    async fn bot_turn(&self, ticket: BotTicket) {
        let outcome = self.fetch_bot_move(&ticket).await;

        let jobs = {
            let mut cell = self.lock();
            if !ticket.is_live(&cell) {
                debug!("Discarding stale bot response");
                if cell.generation == ticket.generation && cell.state.bot_thinking {
                    // Nothing else can be thinking in this generation.
                    cell.state = transition::apply(
                        &self.inner.rules,
                        &cell.state,
                        &Action::BotThinkingEnded,
                    );
                    self.publish(&cell);
                }
                return;
            }

            let before = cell.state.clone();
            match outcome {
                Ok(bot_move) => {
                    let step = transition::step(
                        &self.inner.rules,
                        &cell.state,
                        &Action::SubmitMove(bot_move.mv.clone()),
                    );
                    match &step.disposition {
                        Disposition::Accepted => {
                            info!(mv = %bot_move.mv, evaluation = bot_move.evaluation, "Bot moved")
                        }
                        Disposition::Rejected(rejection) => {
                            warn!(mv = %bot_move.mv, %rejection, "Bot move rejected")
                        }
                    }
                    cell.state = step.state;
                }
                Err(e) => warn!(error = %e, "Bot move request failed"),
            }

            cell.state =
                transition::apply(&self.inner.rules, &cell.state, &Action::BotThinkingEnded);
            let jobs = self.follow_up(&mut cell, Some(before));
            self.publish(&cell);
            jobs
        };

        self.spawn_jobs(jobs);
    }

    /// Ask the bot, bounded by the configured timeout and retried per the
    /// retry policy while the ticket stays live. A move that does not parse
    /// or is illegal counts as a failed request.
    async fn fetch_bot_move(&self, ticket: &BotTicket) -> Result<BotMove, ClientError> {
        let retry = &self.inner.config.retry;
        let timeout = self.inner.config.bot_timeout();
        let mut attempt = 1;

        loop {
            let request = BotMoveRequest {
                fen: ticket.position.to_string(),
            };
            let result = match tokio::time::timeout(timeout, self.inner.bot.request_move(request)).await
            {
                Ok(result) => result.and_then(|bot_move| self.vet(&ticket.position, bot_move)),
                Err(_) => Err(ClientError::Timeout(timeout)),
            };

            let e = match result {
                Ok(bot_move) => return Ok(bot_move),
                Err(e) => e,
            };
            if attempt >= retry.max_attempts || !self.is_live(ticket) {
                return Err(e);
            }
            warn!(attempt, error = %e, "Bot request failed, retrying");
            tokio::time::sleep(retry.backoff()).await;
            attempt += 1;
        }
    }

    fn is_live(&self, ticket: &BotTicket) -> bool {
        ticket.is_live(&self.lock())
    }

    fn vet(&self, position: &Position, bot_move: BotMove) -> Result<BotMove, ClientError> {
        let half_move: HalfMove = bot_move
            .mv
            .parse()
            .map_err(|e| ClientError::Malformed(format!("move '{}': {e}", bot_move.mv)))?;
        match self.inner.rules.is_legal(position, &half_move) {
            Ok(true) => Ok(bot_move),
            Ok(false) => Err(ClientError::Malformed(format!("illegal move {half_move}"))),
            Err(e) => Err(ClientError::Malformed(e.to_string())),
        }
    }

    #[instrument(skip(self, record), fields(game_id = %record.id))]
    async fn persist(&self, record: GameRecord) {
        match self.inner.persistence.save_game(&record).await {
            Ok(()) => info!(result = ?record.result, plies = record.moves.len(), "Game persisted"),
            Err(e) => warn!(error = %e, "Persisting game failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SessionBuilder;
    use crate::rules::StandardChess;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct GatedBot(Notify);

    #[async_trait]
    impl BotClient for GatedBot {
        async fn request_move(&self, _request: BotMoveRequest) -> Result<BotMove, ClientError> {
            self.0.notified().await;
            Ok(BotMove {
                mv: "e7e5".to_string(),
                evaluation: 0.0,
            })
        }
    }

    struct NullStore;

    #[async_trait]
    impl PersistenceClient for NullStore {
        async fn save_game(&self, _record: &GameRecord) -> Result<(), ClientError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn moved_position_releases_thinking_flag() {
        let bot = Arc::new(GatedBot(Notify::new()));
        let session = SessionBuilder::new()
            .rules(StandardChess)
            .bot_client(bot.clone())
            .persistence(Arc::new(NullStore))
            .build()
            .unwrap();

        session.dispatch(UserAction::SubmitMove("e2e4".to_string()));
        {
            let mut cell = session.lock();
            cell.state = transition::apply(
                &StandardChess,
                &cell.state,
                &Action::SubmitMove("c7c5".to_string()),
            );
        }
        assert!(session.snapshot().bot_thinking);

        bot.0.notify_one();
        session.settle().await;

        let state = session.snapshot();
        assert!(!state.bot_thinking);
        assert_eq!(state.history.notations(), vec!["e2e4", "c7c5"]);
        assert_eq!(
            session.dispatch(UserAction::SubmitMove("g1f3".to_string())),
            Disposition::Accepted
        );
    }

    #[tokio::test]
    async fn reply_from_old_generation_leaves_state_alone() {
        let bot = Arc::new(GatedBot(Notify::new()));
        let session = SessionBuilder::new()
            .rules(StandardChess)
            .bot_client(bot.clone())
            .persistence(Arc::new(NullStore))
            .build()
            .unwrap();

        session.dispatch(UserAction::SubmitMove("e2e4".to_string()));
        session.dispatch(UserAction::Reset);
        let before = session.subscribe().borrow().clone();

        bot.0.notify_one();
        session.settle().await;

        assert_eq!(session.snapshot(), before);
        assert_eq!(session.generation(), 1);
    }
}
