//! Turn/phase state machine.
//!
//! A [`Phase`] starts in [`Phase::Setup`] and moves to [`Phase::Active`] once,
//! on an explicit start. A new game means a new `Phase` value.

mod game;
mod setup;

use std::sync::Arc;

use rand::Rng;
use tracing::{info, instrument, warn};

pub use game::{ActiveGame, BotMove, BotTurn};
pub use setup::{BotConfig, ColorChoice, GameSetup, MAX_LEVEL, MIN_LEVEL, Opponent, Side};

use crate::engine::{Engine, EngineError};
use crate::query::QueryError;
use crate::wire::{Move, WireError};

/// Errors raised by game operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// Engine output could not be parsed.
    #[display("{}", _0)]
    Wire(WireError),

    /// The engine rejected a position or move.
    #[display("{}", _0)]
    Engine(EngineError),

    /// The engine query failed.
    #[display("{}", _0)]
    Query(QueryError),

    /// The move is not legal in the current position.
    #[display("{} is not a legal move", mv)]
    NotLegal {
        /// The rejected move.
        mv: Move,
    },

    /// It is the engine's turn.
    #[display("Not your turn")]
    NotYourTurn,

    /// A game is already in progress.
    #[display("A game is already active")]
    AlreadyActive,
}

impl std::error::Error for GameError {}

impl From<WireError> for GameError {
    fn from(e: WireError) -> Self {
        GameError::Wire(e)
    }
}

impl From<EngineError> for GameError {
    fn from(e: EngineError) -> Self {
        GameError::Engine(e)
    }
}

impl From<QueryError> for GameError {
    fn from(e: QueryError) -> Self {
        GameError::Query(e)
    }
}

/// Setup or an active game.
#[derive(Debug)]
pub enum Phase<E: Engine> {
    /// Choosing options; no game exists.
    Setup,
    /// A game is in progress.
    Active(ActiveGame<E>),
}

impl<E: Engine> Default for Phase<E> {
    fn default() -> Self {
        Phase::Setup
    }
}

impl<E: Engine> Phase<E> {
    /// A fresh phase in [`Phase::Setup`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves from setup to an active game.
    ///
    /// A random colour in `setup` is resolved here, once, from `rng`.
    ///
    /// # Errors
    ///
    /// [`GameError::AlreadyActive`] if a game is running; it is left untouched.
    /// Errors creating the game leave the phase in setup.
    #[instrument(skip(self, engine, rng))]
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        engine: Arc<E>,
        setup: &GameSetup,
        start_position: Option<&str>,
        rng: &mut R,
    ) -> Result<(), GameError> {
        if self.is_active() {
            warn!("Start requested while a game is active");
            return Err(GameError::AlreadyActive);
        }
        let bot = setup.resolve(rng);
        let game = ActiveGame::new(engine, bot, start_position)?;
        info!(?bot, "Entering active phase");
        *self = Phase::Active(game);
        Ok(())
    }

    /// True in [`Phase::Active`].
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Active(_))
    }

    /// The active game, if any.
    pub fn game(&self) -> Option<&ActiveGame<E>> {
        match self {
            Phase::Active(game) => Some(game),
            Phase::Setup => None,
        }
    }

    /// The active game, mutably.
    pub fn game_mut(&mut self) -> Option<&mut ActiveGame<E>> {
        match self {
            Phase::Active(game) => Some(game),
            Phase::Setup => None,
        }
    }
}
