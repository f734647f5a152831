//! Engine boundary: position handles and fixed-depth search.
//!
//! Everything above this module talks to the engine through the
//! [`Engine`] and [`EnginePosition`] traits using plain text: board text,
//! legal-move text, move text and position text (FEN). [`ChessEngine`] is the
//! standard-chess implementation.

mod eval;
mod position;
mod search;

use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};

pub use position::{ChessEngine, ChessPosition};
pub use search::MATE_SCORE;

/// A mutable board-state handle for one game.
pub trait EnginePosition {
    /// Whether white is to move.
    fn side_to_move_is_white(&self) -> bool;

    /// Rank-separated, space-separated piece codes, rank 8 first.
    ///
    /// Uppercase is white, lowercase is black, `.` is empty.
    fn board_text(&self) -> String;

    /// Space-separated four-character move tokens for every legal move.
    fn legal_moves_text(&self) -> String;

    /// Plays the move described by `text`.
    ///
    /// # Errors
    ///
    /// [`EngineError::IllegalMove`] if `text` is not a legal move here. The
    /// position is unchanged on error.
    fn apply_move_text(&mut self, text: &str) -> Result<(), EngineError>;

    /// Serialized position, used as a search snapshot.
    fn to_position_text(&self) -> String;

    /// Whether the game has ended, and how.
    fn status(&self) -> GameStatus;

    /// Static evaluation in centipawns from the side to move's perspective.
    fn evaluate(&self) -> i32;
}

/// The engine itself: creates positions and searches them.
///
/// Shared between the foreground and the background search context, hence
/// `Send + Sync`.
pub trait Engine: Send + Sync + 'static {
    /// Position handle type produced by this engine.
    type Position: EnginePosition + Send;

    /// Creates the standard starting position, or one decoded from `text`.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPositionText`] if `text` cannot be decoded.
    fn new_position(&self, text: Option<&str>) -> Result<Self::Position, EngineError>;

    /// Searches `position` to `depth` plies.
    ///
    /// `stop` is polled throughout; once raised the search unwinds and
    /// returns [`EngineError::SearchAborted`].
    fn search(
        &self,
        position: &mut Self::Position,
        depth: u32,
        stop: &AtomicBool,
    ) -> Result<SearchReport, EngineError>;
}

/// Result of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Score from the side to move's perspective.
    pub score: i32,
    /// Best move as a four-character token, absent in terminal positions.
    pub best_move: Option<String>,
    /// Nodes visited.
    pub nodes_searched: u64,
}

/// Game-over state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Moves remain.
    Ongoing,
    /// The side to move is mated.
    Checkmate {
        /// True if white delivered mate.
        white_wins: bool,
    },
    /// The side to move has no legal moves and is not in check.
    Stalemate,
    /// Neither side can mate.
    InsufficientMaterial,
}

impl GameStatus {
    /// True for every state except [`GameStatus::Ongoing`].
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    /// Human-readable summary.
    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Ongoing => "In progress",
            GameStatus::Checkmate { white_wins: true } => "Checkmate, white wins",
            GameStatus::Checkmate { white_wins: false } => "Checkmate, black wins",
            GameStatus::Stalemate => "Stalemate",
            GameStatus::InsufficientMaterial => "Draw by insufficient material",
        }
    }
}

/// Errors raised by the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum EngineError {
    /// The engine rejected a move.
    #[display("Illegal move {:?}", text)]
    IllegalMove {
        /// Move text as submitted.
        text: String,
    },

    /// Position text could not be decoded.
    #[display("Invalid position text {:?}: {}", text, reason)]
    InvalidPositionText {
        /// Text as submitted.
        text: String,
        /// Decoder message.
        reason: String,
    },

    /// The search was stopped before completing.
    #[display("Search aborted")]
    SearchAborted,
}

impl std::error::Error for EngineError {}
