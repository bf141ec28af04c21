//! Commands: the effects a transition asks the orchestrator to perform.
//!
//! Rather than having the shell watch the state and decide what to do, the
//! core derives an explicit command list from each transition. The trigger
//! logic (when to ask the bot for a move, when a game has ended, when to
//! persist it) is therefore plain, testable, pure code.

use super::guard::Guard;
use super::state::{GameResult, Side, SessionState};
use crate::rules::{Position, RulesEngine, TerminalStatus};
use tracing::warn;

/// An effect requested by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Ask the bot service for a move in `position`.
    RequestBotMove { position: Position },

    /// The position is terminal; the result must be set to this value.
    DeclareResult(GameResult),

    /// The game has just finished; store it.
    PersistGame {
        moves: Vec<String>,
        result: GameResult,
        final_position: Position,
    },
}

/// Verdict for a terminal status: checkmate is a win for the side that just
/// moved, every other terminal condition is a draw.
pub fn verdict_for(status: TerminalStatus) -> Option<GameResult> {
    match status {
        TerminalStatus::InProgress => None,
        TerminalStatus::Checkmate { winner } => Some(GameResult::win_for(winner)),
        TerminalStatus::Draw => Some(GameResult::Draw),
    }
}

/// Derive the commands for the transition `prev -> next`.
///
/// `prev` is `None` for a fresh session (start or reset), in which case the
/// state is evaluated as if it had just been entered. The bot trigger is
/// edge-activated: it fires only when the position changed, so clearing the
/// thinking flag after a failed request never re-triggers by itself.
///
/// # Example
///
/// ```rust
/// use sparring::core::{command, transition, Action, Command, SessionState, Side};
/// use sparring::rules::StandardChess;
///
/// let start = SessionState::initial(&StandardChess);
/// let next = transition::apply(&StandardChess, &start, &Action::SubmitMove("e2e4".into()));
///
/// let commands = command::commands(&StandardChess, Side::Black, Some(&start), &next);
/// assert_eq!(
///     commands,
///     vec![Command::RequestBotMove { position: next.position.clone() }]
/// );
/// ```
pub fn commands<R: RulesEngine + ?Sized>(
    rules: &R,
    bot_side: Side,
    prev: Option<&SessionState>,
    next: &SessionState,
) -> Vec<Command> {
    if next.is_final() {
        let newly_final = prev.map_or(true, |p| !p.is_final());
        return if newly_final {
            vec![Command::PersistGame {
                moves: next.history.notations(),
                result: next.result,
                final_position: next.position.clone(),
            }]
        } else {
            Vec::new()
        };
    }

    let entered = prev.map_or(true, |p| p.position != next.position);
    if !entered {
        return Vec::new();
    }

    match rules.terminal_status(&next.position) {
        Ok(status) => {
            if let Some(result) = verdict_for(status) {
                return vec![Command::DeclareResult(result)];
            }
        }
        Err(e) => {
            warn!(error = %e, "Cannot evaluate position for commands");
            return Vec::new();
        }
    }

    if Guard::bot_turn(bot_side).check_with(rules, next) {
        vec![Command::RequestBotMove {
            position: next.position.clone(),
        }]
    } else {
        Vec::new()
    }
}
