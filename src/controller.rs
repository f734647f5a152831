//! Game state controller: sole owner of the engine position for one game.
//!
//! Every successful mutation bumps a version counter and yields a fresh
//! [`StateToken`]. Views compare tokens to learn that the position changed
//! without inspecting or copying the position itself.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info, instrument};

use crate::engine::{EngineError, EnginePosition, GameStatus};
use crate::legality::LegalityIndex;
use crate::wire::{Move, WireError, format_move};

static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Change-detection marker for one controller's position.
///
/// Two tokens are equal iff they come from the same controller and no
/// mutation happened between their creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateToken {
    game_id: u64,
    version: u64,
}

impl StateToken {
    /// Number of moves applied through the controller when this token was issued.
    pub fn version(self) -> u64 {
        self.version
    }
}

/// Owns the single mutable position handle of an active game.
#[derive(Debug)]
pub struct GameStateController<P> {
    position: P,
    game_id: u64,
    version: u64,
}

impl<P: EnginePosition> GameStateController<P> {
    /// Takes ownership of `position`.
    #[instrument(skip(position))]
    pub fn new(position: P) -> Self {
        let game_id = NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed);
        info!(game_id, "Creating game state controller");
        Self {
            position,
            game_id,
            version: 0,
        }
    }

    /// Plays `mv` on the owned position and returns the new token.
    ///
    /// Performs no validation of its own; callers check the
    /// [`LegalityIndex`] first.
    ///
    /// # Errors
    ///
    /// [`EngineError::IllegalMove`] if the engine rejects the move. This means
    /// the index and the engine disagree, so it is logged at error level and
    /// the token is left unchanged.
    #[instrument(skip(self), fields(game_id = self.game_id, version = self.version))]
    pub fn apply_move(&mut self, mv: Move) -> Result<StateToken, EngineError> {
        let text = format_move(mv);
        if let Err(e) = self.position.apply_move_text(&text) {
            error!(error = %e, "Engine rejected a move the caller considered legal");
            return Err(e);
        }
        self.version += 1;
        debug!(mv = %text, version = self.version, "Move applied");
        Ok(self.current_token())
    }

    /// Token for the current position contents.
    pub fn current_token(&self) -> StateToken {
        StateToken {
            game_id: self.game_id,
            version: self.version,
        }
    }

    /// Read-only view of the position.
    pub fn position(&self) -> &P {
        &self.position
    }

    /// Serialized position for dispatching a search.
    pub fn snapshot(&self) -> String {
        self.position.to_position_text()
    }

    /// Whether white is to move.
    pub fn white_to_move(&self) -> bool {
        self.position.side_to_move_is_white()
    }

    /// Game-over state according to the engine.
    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// Builds a fresh legality index for the current position.
    ///
    /// # Errors
    ///
    /// Propagates malformed engine output; no partial index is produced.
    pub fn legality_index(&self) -> Result<LegalityIndex, WireError> {
        LegalityIndex::build(
            &self.position.legal_moves_text(),
            self.position.side_to_move_is_white(),
        )
    }
}
