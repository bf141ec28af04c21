//! End-to-end scenarios for a session against scripted remote collaborators.

use async_trait::async_trait;
use sparring::config::RetryPolicy;
use sparring::core::{Disposition, Rejection, Verdict};
use sparring::effects::{BotClient, BotMove, BotMoveRequest, ClientError, GameRecord, PersistenceClient};
use sparring::enforcement::{SubmissionPolicy, SubmissionViolation};
use sparring::{
    GameResult, Session, SessionBuilder, SessionConfig, SessionState, Side, StandardChess,
    UserAction,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn reply(mv: &str) -> Result<BotMove, ClientError> {
    Ok(BotMove {
        mv: mv.to_string(),
        evaluation: 0.0,
    })
}

/// Answers from a fixed script, recording every position it was asked about.
#[derive(Default)]
struct ScriptedBot {
    replies: Mutex<VecDeque<Result<BotMove, ClientError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedBot {
    fn new(replies: Vec<Result<BotMove, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn moves(moves: &[&str]) -> Arc<Self> {
        Self::new(moves.iter().map(|m| reply(m)).collect())
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BotClient for ScriptedBot {
    async fn request_move(&self, request: BotMoveRequest) -> Result<BotMove, ClientError> {
        self.requests.lock().unwrap().push(request.fen);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("script exhausted".to_string())))
    }
}

/// Holds every answer until the test opens the gate.
struct GatedBot {
    gate: Notify,
    reply: BotMove,
    requests: AtomicUsize,
}

impl GatedBot {
    fn new(mv: &str) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            reply: BotMove {
                mv: mv.to_string(),
                evaluation: 0.0,
            },
            requests: AtomicUsize::new(0),
        })
    }

    fn open(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl BotClient for GatedBot {
    async fn request_move(&self, _request: BotMoveRequest) -> Result<BotMove, ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(self.reply.clone())
    }
}

/// Never answers.
struct SilentBot;

#[async_trait]
impl BotClient for SilentBot {
    async fn request_move(&self, _request: BotMoveRequest) -> Result<BotMove, ClientError> {
        std::future::pending().await
    }
}

#[derive(Default)]
struct RecordingStore {
    games: Mutex<Vec<GameRecord>>,
}

impl RecordingStore {
    fn games(&self) -> Vec<GameRecord> {
        self.games.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceClient for RecordingStore {
    async fn save_game(&self, record: &GameRecord) -> Result<(), ClientError> {
        self.games.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Rejects every write, counting the attempts.
#[derive(Default)]
struct FailingStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl PersistenceClient for FailingStore {
    async fn save_game(&self, _record: &GameRecord) -> Result<(), ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::Status {
            status: 503,
            body: "storage offline".to_string(),
        })
    }
}

fn start(
    bot: Arc<dyn BotClient>,
    store: Arc<dyn PersistenceClient>,
    config: SessionConfig,
) -> Session<StandardChess> {
    SessionBuilder::new()
        .rules(StandardChess)
        .bot_client(bot)
        .persistence(store)
        .config(config)
        .build()
        .unwrap()
}

fn submit(session: &Session<StandardChess>, notation: &str) -> Disposition {
    session.dispatch(UserAction::SubmitMove(notation.to_string()))
}

fn policy_violations(disposition: Disposition) -> Vec<SubmissionViolation> {
    match disposition {
        Disposition::Rejected(Rejection::Policy(violations)) => violations,
        other => panic!("expected policy rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn human_move_triggers_bot_reply() {
    let bot = ScriptedBot::moves(&["e7e5"]);
    let session = start(bot.clone(), Arc::new(RecordingStore::default()), SessionConfig::default());

    assert_eq!(submit(&session, "e2e4"), Disposition::Accepted);
    let state = session.snapshot();
    assert_eq!(state.history.notations(), vec!["e2e4"]);
    assert!(state.bot_thinking);

    session.settle().await;

    let state = session.snapshot();
    assert_eq!(state.history.notations(), vec!["e2e4", "e7e5"]);
    assert!(!state.bot_thinking);
    assert_eq!(state.result, GameResult::InProgress);
    assert!(session.projection().unwrap().captures.is_empty());
    assert_eq!(
        bot.requests(),
        vec!["rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"]
    );
}

#[tokio::test]
async fn illegal_move_is_rejected_without_bot_request() {
    let bot = ScriptedBot::moves(&[]);
    let session = start(bot.clone(), Arc::new(RecordingStore::default()), SessionConfig::default());

    let disposition = submit(&session, "e2e5");
    assert!(matches!(
        disposition,
        Disposition::Rejected(Rejection::Illegal(_))
    ));

    session.settle().await;
    assert_eq!(session.snapshot(), SessionState::initial(&StandardChess));
    assert!(bot.requests().is_empty());
}

#[tokio::test]
async fn scholars_mate_is_declared_and_persisted_once() {
    let bot = ScriptedBot::moves(&["e7e5", "b8c6", "g8f6"]);
    let store = Arc::new(RecordingStore::default());
    let session = start(bot.clone(), store.clone(), SessionConfig::default());

    for mv in ["e2e4", "f1c4", "d1h5", "h5f7"] {
        assert_eq!(submit(&session, mv), Disposition::Accepted, "move {mv}");
        session.settle().await;
    }

    let state = session.snapshot();
    assert_eq!(state.result, GameResult::WhiteWins);
    assert!(!state.bot_thinking);
    assert_eq!(bot.requests().len(), 3);

    let games = store.games();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].result, Verdict::White);
    assert_eq!(
        games[0].moves,
        vec!["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"]
    );
    assert_eq!(games[0].fen, state.position.to_string());
}

#[tokio::test]
async fn failed_persistence_keeps_result_and_history() {
    let bot = ScriptedBot::moves(&["e7e5", "b8c6", "g8f6", "e7e5"]);
    let store = Arc::new(FailingStore::default());
    let session = start(bot, store.clone(), SessionConfig::default());

    for mv in ["e2e4", "f1c4", "d1h5", "h5f7"] {
        submit(&session, mv);
        session.settle().await;
    }

    let state = session.snapshot();
    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(state.result, GameResult::WhiteWins);
    assert_eq!(
        state.history.notations(),
        vec!["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"]
    );
    assert!(!state.bot_thinking);

    assert_eq!(session.dispatch(UserAction::Reset), Disposition::Accepted);
    assert_eq!(submit(&session, "e2e4"), Disposition::Accepted);
    session.settle().await;
    assert_eq!(session.snapshot().history.notations(), vec!["e2e4", "e7e5"]);
    assert_eq!(session.result(), GameResult::InProgress);
}

#[tokio::test]
async fn bot_checkmate_ends_the_game() {
    let bot = ScriptedBot::moves(&["e7e5", "d8h4"]);
    let store = Arc::new(RecordingStore::default());
    let session = start(bot, store.clone(), SessionConfig::default());

    for mv in ["f2f3", "g2g4"] {
        submit(&session, mv);
        session.settle().await;
    }

    assert_eq!(session.result(), GameResult::BlackWins);
    assert_eq!(store.games().len(), 1);
    assert_eq!(store.games()[0].result, Verdict::Black);
}

#[tokio::test]
async fn moves_after_game_over_are_refused() {
    let bot = ScriptedBot::moves(&["e7e5", "b8c6", "g8f6"]);
    let store = Arc::new(RecordingStore::default());
    let session = start(bot, store.clone(), SessionConfig::default());
    for mv in ["e2e4", "f1c4", "d1h5", "h5f7"] {
        submit(&session, mv);
        session.settle().await;
    }

    let violations = policy_violations(submit(&session, "a7a6"));
    assert!(violations.contains(&SubmissionViolation::GameOver {
        result: GameResult::WhiteWins
    }));

    session.settle().await;
    assert_eq!(session.snapshot().history.len(), 7);
    assert_eq!(store.games().len(), 1);
}

#[tokio::test]
async fn failed_bot_request_clears_thinking_without_retry() {
    let bot = ScriptedBot::new(vec![Err(ClientError::Status {
        status: 500,
        body: "engine crashed".to_string(),
    })]);
    let session = start(bot.clone(), Arc::new(RecordingStore::default()), SessionConfig::default());

    submit(&session, "e2e4");
    session.settle().await;

    let state = session.snapshot();
    assert!(!state.bot_thinking);
    assert_eq!(state.history.len(), 1);
    assert_eq!(bot.requests().len(), 1);

    // Still the bot's turn; the human cannot move for it.
    let violations = policy_violations(submit(&session, "e7e5"));
    assert_eq!(
        violations,
        vec![SubmissionViolation::NotYourTurn {
            turn_owner: Side::Black
        }]
    );
}

#[tokio::test]
async fn recheck_retries_after_failure() {
    let bot = ScriptedBot::new(vec![
        Err(ClientError::Transport("connection refused".to_string())),
        reply("e7e5"),
    ]);
    let session = start(bot.clone(), Arc::new(RecordingStore::default()), SessionConfig::default());

    submit(&session, "e2e4");
    session.settle().await;
    assert_eq!(session.snapshot().history.len(), 1);

    assert!(session.recheck());
    session.settle().await;

    assert_eq!(session.snapshot().history.notations(), vec!["e2e4", "e7e5"]);
    assert_eq!(bot.requests().len(), 2);
    assert!(!session.recheck());
}

#[tokio::test]
async fn retry_policy_retries_within_one_turn() {
    let bot = ScriptedBot::new(vec![
        Err(ClientError::Transport("connection reset".to_string())),
        reply("c7c5"),
    ]);
    let config = SessionConfig {
        retry: RetryPolicy {
            max_attempts: 2,
            backoff_ms: 1,
        },
        ..SessionConfig::default()
    };
    let session = start(bot.clone(), Arc::new(RecordingStore::default()), config);

    submit(&session, "e2e4");
    session.settle().await;

    assert_eq!(session.snapshot().history.notations(), vec!["e2e4", "c7c5"]);
    assert_eq!(bot.requests().len(), 2);
}

#[tokio::test]
async fn malformed_bot_move_counts_as_failure() {
    let bot = ScriptedBot::moves(&["zz99"]);
    let session = start(bot, Arc::new(RecordingStore::default()), SessionConfig::default());

    submit(&session, "e2e4");
    session.settle().await;

    let state = session.snapshot();
    assert!(!state.bot_thinking);
    assert_eq!(state.history.notations(), vec!["e2e4"]);
}

#[tokio::test]
async fn illegal_bot_move_counts_as_failure() {
    let bot = ScriptedBot::moves(&["e2e4"]);
    let session = start(bot, Arc::new(RecordingStore::default()), SessionConfig::default());

    submit(&session, "d2d4");
    session.settle().await;

    let state = session.snapshot();
    assert!(!state.bot_thinking);
    assert_eq!(state.history.notations(), vec!["d2d4"]);
}

#[tokio::test]
async fn slow_bot_times_out() {
    let config = SessionConfig {
        bot_timeout_ms: 50,
        ..SessionConfig::default()
    };
    let session = start(Arc::new(SilentBot), Arc::new(RecordingStore::default()), config);

    submit(&session, "e2e4");
    session.settle().await;

    let state = session.snapshot();
    assert!(!state.bot_thinking);
    assert_eq!(state.history.len(), 1);
}

#[tokio::test]
async fn submissions_are_refused_while_bot_thinks() {
    let bot = GatedBot::new("e7e5");
    let session = start(bot.clone(), Arc::new(RecordingStore::default()), SessionConfig::default());

    submit(&session, "e2e4");
    let violations = policy_violations(submit(&session, "d2d4"));
    assert!(violations.contains(&SubmissionViolation::BotThinking));
    assert_eq!(session.snapshot().history.len(), 1);

    bot.open();
    session.settle().await;
    assert_eq!(session.snapshot().history.notations(), vec!["e2e4", "e7e5"]);
    assert_eq!(bot.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn extra_checks_cannot_lift_standard_refusals() {
    let bot = GatedBot::new("e7e5");
    let session = SessionBuilder::new()
        .rules(StandardChess)
        .bot_client(bot.clone())
        .persistence(Arc::new(RecordingStore::default()))
        .extra_checks(SubmissionPolicy::permissive())
        .build()
        .unwrap();

    submit(&session, "e2e4");
    let violations = policy_violations(submit(&session, "c7c5"));
    assert!(violations.contains(&SubmissionViolation::BotThinking));
    assert!(violations.contains(&SubmissionViolation::NotYourTurn {
        turn_owner: Side::Black
    }));

    bot.open();
    session.settle().await;

    let state = session.snapshot();
    assert_eq!(state.history.notations(), vec!["e2e4", "e7e5"]);
    assert!(!state.bot_thinking);
    assert_eq!(submit(&session, "g1f3"), Disposition::Accepted);
}

#[tokio::test]
async fn extra_checks_add_refusals() {
    let session = SessionBuilder::new()
        .rules(StandardChess)
        .bot_client(ScriptedBot::moves(&[]))
        .persistence(Arc::new(RecordingStore::default()))
        .extra_checks(
            SubmissionPolicy::permissive()
                .require_pred(|ctx| ctx.notation != "a2a3", "No slow openings".to_string()),
        )
        .build()
        .unwrap();

    let violations = policy_violations(submit(&session, "a2a3"));
    assert_eq!(
        violations,
        vec![SubmissionViolation::CustomCheckFailed {
            message: "No slow openings".to_string()
        }]
    );
    assert!(session.snapshot().history.is_empty());
    session.settle().await;
}

#[tokio::test]
async fn reset_discards_outstanding_bot_reply() {
    let bot = GatedBot::new("e7e5");
    let session = start(bot.clone(), Arc::new(RecordingStore::default()), SessionConfig::default());

    submit(&session, "e2e4");
    assert!(session.snapshot().bot_thinking);

    assert_eq!(session.dispatch(UserAction::Reset), Disposition::Accepted);
    assert_eq!(session.generation(), 1);
    assert_eq!(session.snapshot(), SessionState::initial(&StandardChess));

    bot.open();
    session.settle().await;

    assert_eq!(session.snapshot(), SessionState::initial(&StandardChess));
}

#[tokio::test]
async fn bot_opens_when_human_plays_black() {
    let bot = ScriptedBot::moves(&["d2d4", "c2c4"]);
    let config = SessionConfig {
        human_side: Side::Black,
        ..SessionConfig::default()
    };
    let session = start(bot.clone(), Arc::new(RecordingStore::default()), config);

    assert!(session.snapshot().bot_thinking);
    session.settle().await;
    assert_eq!(session.snapshot().history.notations(), vec!["d2d4"]);

    // Reset re-evaluates the fresh position, so the bot opens again.
    session.dispatch(UserAction::Reset);
    session.settle().await;
    assert_eq!(session.snapshot().history.notations(), vec!["c2c4"]);
    assert_eq!(bot.requests().len(), 2);
}

#[tokio::test]
async fn subscribers_see_latest_state() {
    let bot = ScriptedBot::moves(&["e7e5"]);
    let session = start(bot, Arc::new(RecordingStore::default()), SessionConfig::default());
    let mut updates = session.subscribe();

    submit(&session, "e2e4");
    assert!(updates.has_changed().unwrap());
    assert!(updates.borrow_and_update().bot_thinking);

    session.settle().await;
    assert_eq!(updates.borrow_and_update().history.len(), 2);
}

#[tokio::test]
async fn projection_follows_history() {
    let bot = ScriptedBot::moves(&["d7d5"]);
    let session = start(bot, Arc::new(RecordingStore::default()), SessionConfig::default());

    submit(&session, "e2e4");
    session.settle().await;
    submit(&session, "e4d5");

    let projection = session.projection().unwrap();
    assert_eq!(projection.move_pairs(), vec!["1. e4 d5", "2. exd5"]);
    assert_eq!(projection.captures.by(Side::White).len(), 1);
    assert!(projection.captures.by(Side::Black).is_empty());
    session.settle().await;
}

#[tokio::test]
async fn checkpoint_resumes_into_new_session() {
    let bot = ScriptedBot::moves(&["e7e5"]);
    let session = start(bot, Arc::new(RecordingStore::default()), SessionConfig::default());
    submit(&session, "e2e4");
    session.settle().await;

    let json = session.checkpoint().to_json().unwrap();
    let checkpoint = sparring::checkpoint::SessionCheckpoint::from_json(&json).unwrap();

    let resumed = SessionBuilder::new()
        .rules(StandardChess)
        .bot_client(ScriptedBot::moves(&[]))
        .persistence(Arc::new(RecordingStore::default()))
        .resume_from(checkpoint)
        .build()
        .unwrap();

    assert_eq!(resumed.snapshot(), session.snapshot());
    assert_eq!(submit(&resumed, "g1f3"), Disposition::Accepted);
    resumed.settle().await;
}
