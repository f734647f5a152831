//! Move wire format: the engine's flat move-list text and its structured form.
//!
//! The engine enumerates legal moves as one whitespace-separated string whose
//! tokens are exactly four characters: origin file, origin rank, destination
//! file, destination rank (`e2e4`). This module converts between that text and
//! [`Square`]/[`Move`] values. It holds no state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of rows (ranks) and columns (files) on the board.
pub const BOARD_SIZE: u8 = 8;

/// Length of one move token on the wire.
pub const MOVE_TOKEN_LEN: usize = 4;

/// One board cell.
///
/// `row` 0 is rank 1 and `col` 0 is file a. The text form is the file letter
/// followed by the rank digit, so `Square { row: 1, col: 4 }` is `e2`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Row index, 0 = rank 1.
    pub fn row(self) -> u8 {
        self.row
    }

    /// Column index, 0 = file a.
    pub fn col(self) -> u8 {
        self.col
    }

    /// Iterates all 64 squares, rank 1 first, file a first within a rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Square { row, col }))
    }

    /// Returns the square offset by the given deltas, if it stays on the board.
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Square> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        encode_square(row.try_into().ok()?, col.try_into().ok()?).ok()
    }
}

/// Builds a square from discrete coordinates.
///
/// # Errors
///
/// Returns [`WireError::OutOfRange`] if either coordinate is not below
/// [`BOARD_SIZE`].
#[instrument]
pub fn encode_square(row: u8, col: u8) -> Result<Square, WireError> {
    if row >= BOARD_SIZE || col >= BOARD_SIZE {
        return Err(WireError::OutOfRange { row, col });
    }
    Ok(Square { row, col })
}

/// Inverse of [`encode_square`].
pub fn decode_square(square: Square) -> (u8, u8) {
    (square.row, square.col)
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.col) as char;
        let rank = (b'1' + self.row) as char;
        write!(f, "{}{}", file, rank)
    }
}

impl FromStr for Square {
    type Err = WireError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || WireError::InvalidSquare {
            text: text.to_string(),
        };
        let &[file, rank] = text.as_bytes() else {
            return Err(invalid());
        };
        if !(b'a'..b'a' + BOARD_SIZE).contains(&file) || !(b'1'..b'1' + BOARD_SIZE).contains(&rank) {
            return Err(invalid());
        }
        Ok(Square {
            row: rank - b'1',
            col: file - b'a',
        })
    }
}

/// An ordered (origin, destination) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Square the piece leaves.
    pub origin: Square,
    /// Square the piece lands on.
    pub destination: Square,
}

impl Move {
    /// Creates a move.
    pub fn new(origin: Square, destination: Square) -> Self {
        Self {
            origin,
            destination,
        }
    }

    /// Parses a single four-character token.
    ///
    /// # Errors
    ///
    /// [`WireError::MalformedToken`] if the token is not four characters long,
    /// [`WireError::InvalidSquare`] if either half is not a board square.
    pub fn from_token(token: &str) -> Result<Self, WireError> {
        let len = token.chars().count();
        if len != MOVE_TOKEN_LEN {
            return Err(WireError::MalformedToken {
                token: token.to_string(),
                len,
            });
        }
        let mid = token
            .char_indices()
            .nth(MOVE_TOKEN_LEN / 2)
            .map_or(token.len(), |(at, _)| at);
        let (origin, destination) = token.split_at(mid);
        Ok(Self::new(origin.parse()?, destination.parse()?))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin, self.destination)
    }
}

impl FromStr for Move {
    type Err = WireError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::from_token(token)
    }
}

/// Parses the engine's whitespace-separated legal-move string.
///
/// Empty or whitespace-only input yields an empty list (no legal moves).
///
/// # Errors
///
/// Fails on the first malformed token; no partial list is returned.
#[instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn parse_move_list(raw: &str) -> Result<Vec<Move>, WireError> {
    raw.split_whitespace().map(Move::from_token).collect()
}

/// Formats a move as the text the engine boundary accepts.
pub fn format_move(mv: Move) -> String {
    mv.to_string()
}

/// Errors produced while reading wire data from the engine.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum WireError {
    /// A move token did not have exactly four characters.
    #[display("Malformed move token {:?}: expected 4 characters, found {}", token, len)]
    MalformedToken {
        /// The offending token.
        token: String,
        /// Its length in characters.
        len: usize,
    },

    /// Square text was not a file letter followed by a rank digit.
    #[display("Invalid square {:?}", text)]
    InvalidSquare {
        /// The offending text.
        text: String,
    },

    /// Coordinates fell outside the board.
    #[display("Square coordinates ({}, {}) are off the board", row, col)]
    OutOfRange {
        /// Requested row.
        row: u8,
        /// Requested column.
        col: u8,
    },

    /// The engine's board text did not describe an 8x8 grid.
    #[display("Malformed board text: {}", reason)]
    MalformedBoard {
        /// What was wrong with it.
        reason: String,
    },
}

impl std::error::Error for WireError {}
