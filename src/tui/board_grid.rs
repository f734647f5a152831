//! Parsed engine board text, addressable by [`Square`].

use tracing::instrument;

use crate::wire::{BOARD_SIZE, Square, WireError, encode_square};

const SIZE: usize = BOARD_SIZE as usize;

/// An 8x8 grid of piece codes. Uppercase is white, lowercase is black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardGrid {
    // Indexed [row][col], row 0 = rank 1.
    cells: [[Option<char>; SIZE]; SIZE],
}

impl BoardGrid {
    /// Parses engine board text: eight lines, rank 8 first, eight
    /// space-separated codes per line, `.` for empty.
    ///
    /// # Errors
    ///
    /// [`WireError::MalformedBoard`] if the text is not an 8x8 grid of
    /// single-character codes.
    #[instrument(skip(text))]
    pub fn parse(text: &str) -> Result<Self, WireError> {
        let malformed = |reason: String| WireError::MalformedBoard { reason };
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() != SIZE {
            return Err(malformed(format!("expected {} ranks, found {}", SIZE, lines.len())));
        }

        let mut cells = [[None; SIZE]; SIZE];
        for (i, line) in lines.iter().enumerate() {
            let row = SIZE - 1 - i;
            let codes: Vec<&str> = line.split_whitespace().collect();
            if codes.len() != SIZE {
                return Err(malformed(format!(
                    "rank {} has {} squares",
                    row + 1,
                    codes.len()
                )));
            }
            for (col, code) in codes.into_iter().enumerate() {
                let mut chars = code.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return Err(malformed(format!("bad piece code {:?}", code)));
                };
                cells[row][col] = (c != '.').then_some(c);
            }
        }
        Ok(Self { cells })
    }

    /// Piece code on `square`.
    pub fn piece_at(&self, square: Square) -> Option<char> {
        self.cells[usize::from(square.row())][usize::from(square.col())]
    }

    /// Squares in screen order, top row first.
    ///
    /// Unflipped, rank 8 is on top and file a on the left; flipped is the
    /// board seen from black's side.
    pub fn screen_rows(flipped: bool) -> Vec<Vec<Square>> {
        let rows: Vec<u8> = if flipped {
            (0..BOARD_SIZE).collect()
        } else {
            (0..BOARD_SIZE).rev().collect()
        };
        let cols: Vec<u8> = if flipped {
            (0..BOARD_SIZE).rev().collect()
        } else {
            (0..BOARD_SIZE).collect()
        };
        rows.iter()
            .map(|&row| {
                cols.iter()
                    .filter_map(|&col| encode_square(row, col).ok())
                    .collect()
            })
            .collect()
    }
}

/// Unicode glyph for a piece code.
pub fn glyph(code: char) -> char {
    match code {
        'K' => '♔',
        'Q' => '♕',
        'R' => '♖',
        'B' => '♗',
        'N' => '♘',
        'P' => '♙',
        'k' => '♚',
        'q' => '♛',
        'r' => '♜',
        'b' => '♝',
        'n' => '♞',
        'p' => '♟',
        other => other,
    }
}
