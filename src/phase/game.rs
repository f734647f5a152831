//! An active game: controller, cached legality index and the engine opponent.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::GameError;
use super::setup::BotConfig;
use crate::controller::{GameStateController, StateToken};
use crate::engine::{Engine, EnginePosition, GameStatus};
use crate::legality::LegalityIndex;
use crate::query::{PendingQuery, QueryCoordinator, QueryError, QueryResponse, QueryStatus};
use crate::wire::Move;

/// A move the engine played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotMove {
    /// The move as applied.
    pub mv: Move,
    /// Token of the position after the move.
    pub token: StateToken,
    /// Search score from the engine's perspective.
    pub score: i32,
    /// Nodes the search visited.
    pub nodes_searched: u64,
}

/// Outcome of waiting for or polling the engine's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotTurn {
    /// No query is outstanding.
    Idle,
    /// The query has not answered yet. Only returned by polling.
    Thinking,
    /// The engine's move was applied.
    Moved(BotMove),
    /// The engine found no move; nothing was applied.
    NoMove,
    /// The answer no longer matched the game and was dropped.
    Superseded,
}

struct InFlight {
    query: PendingQuery,
    dispatched_for: StateToken,
}

/// The state carried by [`Phase::Active`](super::Phase::Active).
///
/// Owns the only position handle of the game. Human moves go through
/// [`ActiveGame::play`]; engine moves arrive through
/// [`ActiveGame::next_bot_move`] or [`ActiveGame::poll_bot_move`]. Both paths
/// apply moves through the same controller call.
pub struct ActiveGame<E: Engine> {
    controller: GameStateController<E::Position>,
    bot: Option<BotConfig>,
    coordinator: QueryCoordinator<E>,
    pending: Option<InFlight>,
    index: LegalityIndex,
    index_token: StateToken,
    last_bot_move: Option<BotMove>,
}

impl<E: Engine> ActiveGame<E> {
    /// Starts a game from the standard position or from `start_position`.
    ///
    /// If the engine moves first its query is dispatched immediately.
    ///
    /// # Errors
    ///
    /// Fails if the start position cannot be decoded or its legal moves
    /// cannot be indexed.
    #[instrument(skip(engine))]
    pub fn new(
        engine: Arc<E>,
        bot: Option<BotConfig>,
        start_position: Option<&str>,
    ) -> Result<Self, GameError> {
        let position = engine.new_position(start_position)?;
        let controller = GameStateController::new(position);
        let index = controller.legality_index()?;
        let index_token = controller.current_token();
        let mut game = Self {
            controller,
            bot,
            coordinator: QueryCoordinator::new(engine),
            pending: None,
            index,
            index_token,
            last_bot_move: None,
        };
        info!(
            bot = ?game.bot,
            white_to_move = game.white_to_move(),
            "Game started"
        );
        game.on_position_changed()?;
        Ok(game)
    }

    /// Plays a human move.
    ///
    /// # Errors
    ///
    /// - [`GameError::NotYourTurn`] while the engine is to move
    /// - [`GameError::NotLegal`] if the legality index does not allow `mv`
    /// - [`GameError::Engine`] if the engine rejects a move the index allowed
    #[instrument(skip(self), fields(mv = %mv))]
    pub fn play(&mut self, mv: Move) -> Result<StateToken, GameError> {
        if self.is_automated_turn() {
            warn!("Human move attempted on the engine's turn");
            return Err(GameError::NotYourTurn);
        }
        if !self.index.allows(mv) {
            debug!("Move not in legality index");
            return Err(GameError::NotLegal { mv });
        }
        let token = self.controller.apply_move(mv)?;
        self.after_move(token)?;
        Ok(token)
    }

    /// Whether a bot is configured and controls the side to move.
    pub fn is_automated_turn(&self) -> bool {
        self.bot
            .is_some_and(|bot| bot.controls(self.controller.white_to_move()))
    }

    /// Runs [`Self::on_position_changed`] after a move was applied.
    ///
    /// If the index could not be rebuilt it is cleared, so no move from the
    /// previous position passes validation.
    fn after_move(&mut self, token: StateToken) -> Result<(), GameError> {
        let result = self.on_position_changed();
        if result.is_err() && self.index_token != token {
            error!(version = token.version(), "Legality index is stale, clearing it");
            self.index = LegalityIndex::default();
        }
        result
    }

    /// Rebuilds the index if the position changed, then starts or cancels the
    /// engine query to match whose turn it is.
    fn on_position_changed(&mut self) -> Result<(), GameError> {
        let token = self.controller.current_token();
        if token != self.index_token {
            self.index = self.controller.legality_index()?;
            self.index_token = token;
            debug!(
                version = token.version(),
                moves = self.index.move_count(),
                "Legality index rebuilt"
            );
        }

        if self
            .pending
            .as_ref()
            .is_some_and(|inflight| inflight.dispatched_for != token)
        {
            debug!("Position moved on, cancelling stale query");
            self.cancel_query();
        }

        match (self.bot, self.is_automated_turn(), self.pending.is_some()) {
            (Some(bot), true, false) => {
                let query = self
                    .coordinator
                    .start_query(self.controller.snapshot(), bot.depth)?;
                info!(query_id = query.id(), depth = bot.depth, "Engine to move, query dispatched");
                self.pending = Some(InFlight {
                    query,
                    dispatched_for: token,
                });
            }
            (_, false, true) => {
                self.cancel_query();
            }
            _ => {}
        }
        Ok(())
    }

    /// Waits for the engine's answer and applies it.
    ///
    /// # Errors
    ///
    /// Propagates search failures other than cancellation, and errors applying
    /// the returned move.
    #[instrument(skip(self))]
    pub async fn next_bot_move(&mut self) -> Result<BotTurn, GameError> {
        let Some(inflight) = self.pending.as_mut() else {
            return Ok(BotTurn::Idle);
        };
        let result = inflight.query.result().await;
        self.finish_query(result)
    }

    /// Applies the engine's answer if it has arrived, without waiting.
    ///
    /// # Errors
    ///
    /// Same as [`ActiveGame::next_bot_move`].
    pub fn poll_bot_move(&mut self) -> Result<BotTurn, GameError> {
        let Some(inflight) = self.pending.as_mut() else {
            return Ok(BotTurn::Idle);
        };
        match inflight.query.try_result() {
            None => Ok(BotTurn::Thinking),
            Some(result) => self.finish_query(result),
        }
    }

    fn finish_query(
        &mut self,
        result: Result<QueryResponse, QueryError>,
    ) -> Result<BotTurn, GameError> {
        let Some(inflight) = self.pending.take() else {
            return Ok(BotTurn::Idle);
        };
        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_cancelled() => {
                debug!(query_id = inflight.query.id(), "Query cancelled, nothing to apply");
                return Ok(BotTurn::Superseded);
            }
            Err(e) => {
                error!(query_id = inflight.query.id(), error = %e, "Engine query failed");
                return Err(e.into());
            }
        };

        if inflight.dispatched_for != self.controller.current_token() || !self.is_automated_turn()
        {
            warn!(query_id = inflight.query.id(), "Dropping superseded engine answer");
            return Ok(BotTurn::Superseded);
        }

        let Some(text) = response.best_move else {
            info!(score = response.score, "Engine has no move");
            return Ok(BotTurn::NoMove);
        };
        let mv = Move::from_token(&text)?;
        let token = self.controller.apply_move(mv)?;
        let bot_move = BotMove {
            mv,
            token,
            score: response.score,
            nodes_searched: response.nodes_searched,
        };
        info!(
            mv = %mv,
            score = response.score,
            nodes = response.nodes_searched,
            "Engine move applied"
        );
        self.last_bot_move = Some(bot_move);
        self.after_move(token)?;
        Ok(BotTurn::Moved(bot_move))
    }

    /// Dispatches a fresh engine query after a failed or cancelled one.
    ///
    /// Does nothing unless it is the engine's turn and no query is outstanding.
    ///
    /// # Errors
    ///
    /// Same as the dispatch performed after a move.
    pub fn retry_query(&mut self) -> Result<(), GameError> {
        self.on_position_changed()
    }

    /// Cancels the outstanding engine query. Returns true if one was cancelled.
    pub fn cancel_query(&mut self) -> bool {
        let Some(inflight) = self.pending.take() else {
            return false;
        };
        let cancelled = self.coordinator.cancel();
        debug!(query_id = inflight.query.id(), cancelled, "Engine query withdrawn");
        cancelled
    }

    /// Legality index for the current position.
    pub fn legality(&self) -> &LegalityIndex {
        &self.index
    }

    /// Token for the current position.
    pub fn token(&self) -> StateToken {
        self.controller.current_token()
    }

    /// Whether white is to move.
    pub fn white_to_move(&self) -> bool {
        self.controller.white_to_move()
    }

    /// Game-over state according to the engine.
    pub fn status(&self) -> GameStatus {
        self.controller.status()
    }

    /// Board text, rank 8 first.
    pub fn board_text(&self) -> String {
        self.controller.position().board_text()
    }

    /// Serialized current position.
    pub fn position_text(&self) -> String {
        self.controller.snapshot()
    }

    /// The engine opponent, if any.
    pub fn bot(&self) -> Option<BotConfig> {
        self.bot
    }

    /// The most recent engine move.
    pub fn last_bot_move(&self) -> Option<BotMove> {
        self.last_bot_move
    }

    /// Status of the outstanding query, if any.
    pub fn pending_status(&self) -> Option<QueryStatus> {
        self.pending.as_ref().map(|inflight| inflight.query.status())
    }

    /// Whether the engine is searching.
    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of background workers spawned for this game.
    pub fn worker_generation(&self) -> u64 {
        self.coordinator.worker_generation()
    }
}

impl<E: Engine> Drop for ActiveGame<E> {
    fn drop(&mut self) {
        if self.cancel_query() {
            debug!("Pending query cancelled on game teardown");
        }
    }
}

impl<E: Engine> fmt::Debug for ActiveGame<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveGame")
            .field("token", &self.controller.current_token())
            .field("bot", &self.bot)
            .field("pending", &self.pending_status())
            .field("moves", &self.index.move_count())
            .finish()
    }
}
