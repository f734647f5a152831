//! Standard chess behind the engine boundary, backed by `shakmaty`.

use std::sync::atomic::AtomicBool;

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Rank, Role, Square};
use tracing::{debug, instrument, warn};

use super::search::Negamax;
use super::{Engine, EngineError, EnginePosition, GameStatus, SearchReport, eval};

/// Standard chess engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessEngine;

impl ChessEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }
}

impl Engine for ChessEngine {
    type Position = ChessPosition;

    #[instrument(skip(self))]
    fn new_position(&self, text: Option<&str>) -> Result<ChessPosition, EngineError> {
        match text {
            None => Ok(ChessPosition::default()),
            Some(fen) => ChessPosition::from_fen(fen),
        }
    }

    #[instrument(skip(self, position, stop), fields(fen = %position.to_position_text()))]
    fn search(
        &self,
        position: &mut ChessPosition,
        depth: u32,
        stop: &AtomicBool,
    ) -> Result<SearchReport, EngineError> {
        let mut searcher = Negamax::new(stop);
        let (best, score) = searcher
            .run(&position.chess, depth)
            .ok_or(EngineError::SearchAborted)?;
        let report = SearchReport {
            score,
            best_move: best.map(|m| short_token(&m)),
            nodes_searched: searcher.nodes(),
        };
        debug!(
            depth,
            score = report.score,
            best = ?report.best_move,
            nodes = report.nodes_searched,
            "Search finished"
        );
        Ok(report)
    }
}

/// A standard chess position handle.
#[derive(Debug, Clone, Default)]
pub struct ChessPosition {
    chess: Chess,
}

impl ChessPosition {
    /// Decodes a FEN string.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPositionText`] if the text is not valid FEN or
    /// describes an impossible position.
    #[instrument]
    pub fn from_fen(text: &str) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::InvalidPositionText {
            text: text.to_string(),
            reason,
        };
        let fen: Fen = text.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
        let chess: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{}", e)))?;
        Ok(Self { chess })
    }

    /// Finds the legal move matching `text`, auto-promoting four-character
    /// pawn moves to a queen.
    fn find_move(&self, text: &str) -> Option<Move> {
        let promoted = format!("{}q", text);
        let mut promotion = None;
        for m in self.chess.legal_moves() {
            let uci = m.to_uci(CastlingMode::Standard).to_string();
            if uci == text {
                return Some(m);
            }
            if uci == promoted {
                promotion = Some(m);
            }
        }
        promotion
    }
}

/// Four-character origin+destination token; promotion letters are dropped.
fn short_token(m: &Move) -> String {
    let mut text = m.to_uci(CastlingMode::Standard).to_string();
    text.truncate(4);
    text
}

impl EnginePosition for ChessPosition {
    fn side_to_move_is_white(&self) -> bool {
        self.chess.turn().is_white()
    }

    fn board_text(&self) -> String {
        let board = self.chess.board();
        Rank::ALL
            .iter()
            .rev()
            .map(|&rank| {
                File::ALL
                    .iter()
                    .map(|&file| {
                        board
                            .piece_at(Square::from_coords(file, rank))
                            .map_or('.', |piece| piece.char())
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn legal_moves_text(&self) -> String {
        let mut tokens: Vec<String> = Vec::new();
        for m in self.chess.legal_moves().iter() {
            if m.promotion().is_some_and(|role| role != Role::Queen) {
                continue;
            }
            tokens.push(short_token(m));
        }
        tokens.join(" ")
    }

    #[instrument(skip(self))]
    fn apply_move_text(&mut self, text: &str) -> Result<(), EngineError> {
        let Some(m) = self.find_move(text) else {
            warn!(text, "Engine rejected move");
            return Err(EngineError::IllegalMove {
                text: text.to_string(),
            });
        };
        self.chess.play_unchecked(&m);
        Ok(())
    }

    fn to_position_text(&self) -> String {
        Fen(self.chess.clone().into_setup(EnPassantMode::Legal)).to_string()
    }

    fn status(&self) -> GameStatus {
        if self.chess.is_checkmate() {
            GameStatus::Checkmate {
                white_wins: !self.chess.turn().is_white(),
            }
        } else if self.chess.is_stalemate() {
            GameStatus::Stalemate
        } else if self.chess.is_insufficient_material() {
            GameStatus::InsufficientMaterial
        } else {
            GameStatus::Ongoing
        }
    }

    fn evaluate(&self) -> i32 {
        eval::evaluate(&self.chess)
    }
}
