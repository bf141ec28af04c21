//! Compact move notation: origin square, destination square, optional promotion.
//!
//! This is the form the bot service speaks and the form stored in the move
//! history (`"e2e4"`, `"e7e8q"`). Parsing is pure and independent of the rules
//! engine; whether a well-formed half-move is *legal* is a separate question.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when a move string is not a well-formed half-move.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("expected 4 or 5 characters, got {0}")]
    Length(usize),

    #[error("'{0}' contains non-ASCII characters")]
    NonAscii(String),

    #[error("'{0}' is not a square")]
    Square(String),

    #[error("'{0}' is not a promotion piece")]
    Promotion(char),

    #[error("origin and destination are both {0}")]
    NullMove(Square),
}

/// A board square, file `a..h` and rank `1..8`, stored zero-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Build a square from zero-based file and rank.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    pub fn file(&self) -> u8 {
        self.file
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    fn from_ascii(bytes: &[u8]) -> Result<Self, NotationError> {
        let invalid = || NotationError::Square(String::from_utf8_lossy(bytes).into_owned());
        match bytes {
            [f @ b'a'..=b'h', r @ b'1'..=b'8'] => Ok(Self {
                file: f - b'a',
                rank: r - b'1',
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

/// Piece a pawn may promote to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    pub fn from_char(c: char) -> Result<Self, NotationError> {
        match c.to_ascii_lowercase() {
            'q' => Ok(Self::Queen),
            'r' => Ok(Self::Rook),
            'b' => Ok(Self::Bishop),
            'n' => Ok(Self::Knight),
            _ => Err(NotationError::Promotion(c)),
        }
    }

    pub fn char(&self) -> char {
        match self {
            Self::Queen => 'q',
            Self::Rook => 'r',
            Self::Bishop => 'b',
            Self::Knight => 'n',
        }
    }
}

/// One player's single move in compact notation.
///
/// # Example
///
/// ```rust
/// use sparring::core::HalfMove;
///
/// let mv: HalfMove = "e7e8Q".parse().unwrap();
/// assert_eq!(mv.to_string(), "e7e8q");
/// assert!("e2e2".parse::<HalfMove>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HalfMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Promotion>,
}

impl HalfMove {
    pub fn new(from: Square, to: Square, promotion: Option<Promotion>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }
}

impl FromStr for HalfMove {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() {
            return Err(NotationError::NonAscii(s.to_string()));
        }
        let bytes = s.as_bytes();
        if !(4..=5).contains(&bytes.len()) {
            return Err(NotationError::Length(bytes.len()));
        }

        let from = Square::from_ascii(&bytes[0..2])?;
        let to = Square::from_ascii(&bytes[2..4])?;
        if from == to {
            return Err(NotationError::NullMove(from));
        }
        let promotion = bytes
            .get(4)
            .map(|b| Promotion::from_char(*b as char))
            .transpose()?;

        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

impl TryFrom<String> for HalfMove {
    type Error = NotationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HalfMove> for String {
    fn from(value: HalfMove) -> Self {
        value.to_string()
    }
}

impl fmt::Display for HalfMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.char())?;
        }
        Ok(())
    }
}
