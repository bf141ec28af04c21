//! Standard chess rules backed by `shakmaty`.

use super::{LegalMove, MoveMeta, PieceKind, Position, RulesEngine, RulesError, TerminalStatus};
use crate::core::{HalfMove, Side};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Outcome, Position as _, Role};

/// Halfmove clock value at which the fifty-move rule ends the game.
const FIFTY_MOVE_PLIES: u32 = 100;

/// Orthodox chess.
///
/// Positions are exchanged as FEN strings; every call parses its input, so the
/// engine holds no state and can be shared freely between sessions.
///
/// # Example
///
/// ```rust
/// use sparring::rules::{RulesEngine, StandardChess};
///
/// let rules = StandardChess;
/// let start = rules.initial_position();
/// let (after, meta) = rules.apply_move(&start, &"e2e4".parse().unwrap()).unwrap();
/// assert_eq!(meta.notation, "e4");
/// assert_ne!(after, start);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardChess;

impl StandardChess {
    fn parse(&self, position: &Position) -> Result<Chess, RulesError> {
        let invalid = |reason: String| RulesError::InvalidPosition {
            fen: position.as_str().to_string(),
            reason,
        };
        let fen: Fen = position
            .as_str()
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| invalid(e.to_string()))?;
        fen.into_position(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))
    }

    fn encode(chess: &Chess) -> Position {
        Position::new(Fen::from_position(chess.clone(), EnPassantMode::Legal).to_string())
    }

    fn resolve(&self, chess: &Chess, position: &Position, half_move: &HalfMove) -> Result<Move, RulesError> {
        let illegal = || RulesError::IllegalMove {
            notation: half_move.to_string(),
            fen: position.as_str().to_string(),
        };
        let uci: UciMove = half_move.to_string().parse().map_err(|_| illegal())?;
        uci.to_move(chess).map_err(|_| illegal())
    }
}

fn side(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

fn piece_kind(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

impl RulesEngine for StandardChess {
    fn initial_position(&self) -> Position {
        Self::encode(&Chess::default())
    }

    fn side_to_move(&self, position: &Position) -> Result<Side, RulesError> {
        Ok(side(self.parse(position)?.turn()))
    }

    fn legal_moves(&self, position: &Position) -> Result<Vec<LegalMove>, RulesError> {
        let chess = self.parse(position)?;
        let mover = side(chess.turn());
        chess
            .legal_moves()
            .iter()
            .map(|m| {
                let notation = m.to_uci(CastlingMode::Standard).to_string();
                let half_move = notation.parse::<HalfMove>().map_err(|e| {
                    RulesError::InvalidPosition {
                        fen: position.as_str().to_string(),
                        reason: format!("unrepresentable move {notation}: {e}"),
                    }
                })?;
                Ok(LegalMove {
                    half_move,
                    is_capture: m.is_capture(),
                    mover,
                })
            })
            .collect()
    }

    fn apply_move(
        &self,
        position: &Position,
        half_move: &HalfMove,
    ) -> Result<(Position, MoveMeta), RulesError> {
        let chess = self.parse(position)?;
        let m = self.resolve(&chess, position, half_move)?;
        let mover = side(chess.turn());
        let captured = m.capture().map(piece_kind);

        let mut after = chess;
        let notation = SanPlus::from_move_and_play_unchecked(&mut after, &m).to_string();

        Ok((
            Self::encode(&after),
            MoveMeta {
                mover,
                captured,
                notation,
            },
        ))
    }

    fn terminal_status(&self, position: &Position) -> Result<TerminalStatus, RulesError> {
        let chess = self.parse(position)?;
        let status = match chess.outcome() {
            Some(Outcome::Decisive { winner }) => TerminalStatus::Checkmate {
                winner: side(winner),
            },
            Some(Outcome::Draw) => TerminalStatus::Draw,
            None if chess.halfmoves() >= FIFTY_MOVE_PLIES => TerminalStatus::Draw,
            None => TerminalStatus::InProgress,
        };
        Ok(status)
    }
}
