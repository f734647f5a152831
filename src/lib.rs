//! Strictly Chess library - a chess front-end around a pluggable engine.
//!
//! The engine is reached through the narrow text boundary in [`Engine`] and
//! [`EnginePosition`]. Above it sit the pieces that keep the game consistent:
//!
//! - **Wire format**: engine move text to [`Square`]/[`Move`] values
//! - **Legality index**: origin to destination sets for the current position
//! - **Controller**: sole owner of the position, versioned by [`StateToken`]
//! - **Query coordinator**: one background search at a time, cancellable
//! - **Phase**: `Setup -> Active` state machine driving human and engine turns
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_chess::{ChessEngine, GameSetup, Move, Phase};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = Arc::new(ChessEngine::new());
//! let mut phase = Phase::new();
//! phase.start(engine, &GameSetup::default(), None, &mut rand::thread_rng())?;
//!
//! if let Some(game) = phase.game_mut() {
//!     if !game.is_automated_turn() {
//!         game.play(Move::from_token("e2e4")?)?;
//!     }
//!     let reply = game.next_bot_move().await?;
//!     println!("{:?}", reply);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod controller;
mod engine;
mod legality;
mod phase;
mod query;
mod tui;
mod wire;

// Crate-level exports - Configuration
pub use config::{ConfigError, DEFAULT_CONFIG_FILE, PlayConfig};

// Crate-level exports - Wire format
pub use wire::{
    BOARD_SIZE, MOVE_TOKEN_LEN, Move, Square, WireError, decode_square, encode_square,
    format_move, parse_move_list,
};

// Crate-level exports - Legality and state
pub use controller::{GameStateController, StateToken};
pub use legality::LegalityIndex;

// Crate-level exports - Engine boundary
pub use engine::{
    ChessEngine, ChessPosition, Engine, EngineError, EnginePosition, GameStatus, MATE_SCORE,
    SearchReport,
};

// Crate-level exports - Background queries
pub use query::{
    PendingQuery, QueryCoordinator, QueryError, QueryRequest, QueryResponse, QueryStatus,
};

// Crate-level exports - Phase machine
pub use phase::{
    ActiveGame, BotConfig, BotMove, BotTurn, ColorChoice, GameError, GameSetup, MAX_LEVEL,
    MIN_LEVEL, Opponent, Phase, Side,
};

// Crate-level exports - Terminal front-end
pub use tui::{
    AppController, BoardGrid, BoardScreen, DragOutcome, DragSelection, Screen, ScreenTransition,
    SetupScreen, glyph, run_tui,
};
