//! Tests for the turn/phase state machine.

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use common::{GatedEngine, STALEMATE_FEN, TIMEOUT, wait_until};
use rand::SeedableRng;
use rand::rngs::StdRng;
use strictly_chess::{
    ActiveGame, BotConfig, BotTurn, ChessEngine, ChessPosition, ColorChoice, Engine, EngineError,
    EnginePosition, GameError, GameSetup, GameStatus, Move, Opponent, Phase, QueryStatus,
    SearchReport, Side, WireError,
};
use strum::IntoEnumIterator;
use tokio::time::timeout;

fn mv(token: &str) -> Move {
    Move::from_token(token).expect("valid token")
}

fn setup(opponent: Opponent, level: u8, color: ColorChoice) -> GameSetup {
    GameSetup {
        opponent,
        level,
        color,
    }
}

#[tokio::test]
async fn test_human_move_then_engine_reply() {
    let mut phase = Phase::new();
    assert!(!phase.is_active());
    phase
        .start(
            Arc::new(ChessEngine::new()),
            &setup(Opponent::Engine, 1, ColorChoice::White),
            None,
            &mut StdRng::seed_from_u64(1),
        )
        .expect("game starts");
    assert!(phase.is_active());

    let game = phase.game_mut().expect("active game");
    assert_eq!(
        game.bot(),
        Some(BotConfig {
            depth: 2,
            side: Side::Black
        })
    );
    assert!(game.white_to_move());
    assert!(!game.is_automated_turn());
    assert_eq!(game.pending_status(), None);

    let token = game.play(mv("e2e4")).expect("e2e4 is legal");
    assert_eq!(token, game.token());
    assert!(game.is_automated_turn());
    assert!(game.is_thinking());
    assert!(matches!(
        game.pending_status(),
        Some(QueryStatus::Pending | QueryStatus::Delivered)
    ));
    let black_index = game.legality().clone();
    assert!(!black_index.white_to_move());

    let turn = timeout(TIMEOUT, game.next_bot_move())
        .await
        .expect("engine timed out")
        .expect("engine move applies");
    let BotTurn::Moved(reply) = turn else {
        panic!("expected an engine move, got {:?}", turn);
    };
    assert!(black_index.allows(reply.mv));
    assert_eq!(reply.token, game.token());
    assert_eq!(game.token().version(), 2);
    assert_eq!(game.last_bot_move(), Some(reply));
    assert!(!game.is_automated_turn());
    assert!(!game.is_thinking());
    assert!(game.white_to_move());
}

#[tokio::test]
async fn test_depth_one_scenario_from_start_position() {
    let bot = BotConfig {
        depth: 1,
        side: Side::Black,
    };
    let mut game = ActiveGame::new(Arc::new(ChessEngine::new()), Some(bot), None)
        .expect("game starts");
    assert!(!game.is_automated_turn());

    game.play(mv("e2e4")).expect("e2e4 is legal");
    assert!(game.is_automated_turn());

    let turn = timeout(TIMEOUT, game.next_bot_move())
        .await
        .expect("engine timed out")
        .expect("engine move applies");
    assert!(matches!(turn, BotTurn::Moved(_)));
    assert!(!game.is_automated_turn());
    assert_eq!(game.next_bot_move().await, Ok(BotTurn::Idle));
}

#[tokio::test]
async fn test_engine_moves_first_as_white() {
    let mut game = ActiveGame::new(
        Arc::new(ChessEngine::new()),
        Some(BotConfig {
            depth: 1,
            side: Side::White,
        }),
        None,
    )
    .expect("game starts");
    assert!(game.is_automated_turn());
    assert!(game.is_thinking());

    let err = game.play(mv("e7e5")).expect_err("human cannot move for the engine");
    assert_eq!(err, GameError::NotYourTurn);

    let turn = timeout(TIMEOUT, game.next_bot_move())
        .await
        .expect("engine timed out")
        .expect("engine move applies");
    assert!(matches!(turn, BotTurn::Moved(_)));
    assert!(!game.white_to_move());
    assert!(!game.is_automated_turn());
}

#[tokio::test]
async fn test_illegal_move_leaves_position_untouched() {
    let mut game = ActiveGame::new(Arc::new(ChessEngine::new()), None, None).expect("game starts");
    let before = game.token();

    let err = game.play(mv("e2e5")).expect_err("pawn cannot jump three squares");
    assert_eq!(err, GameError::NotLegal { mv: mv("e2e5") });
    assert_eq!(game.token(), before);
    assert!(game.white_to_move());
}

#[tokio::test]
async fn test_terminal_position_resolves_with_no_move() {
    let bot = BotConfig {
        depth: 1,
        side: Side::Black,
    };
    let mut game = ActiveGame::new(Arc::new(ChessEngine::new()), Some(bot), Some(STALEMATE_FEN))
        .expect("game starts");
    assert_eq!(game.status(), GameStatus::Stalemate);
    assert!(game.legality().is_empty());
    assert!(game.is_automated_turn());

    let turn = timeout(TIMEOUT, game.next_bot_move())
        .await
        .expect("engine timed out")
        .expect("query succeeds");
    assert_eq!(turn, BotTurn::NoMove);
    assert_eq!(game.token().version(), 0);
    assert_eq!(game.last_bot_move(), None);
}

#[tokio::test]
async fn test_friend_mode_never_queries() {
    let mut phase = Phase::new();
    phase
        .start(
            Arc::new(ChessEngine::new()),
            &setup(Opponent::Friend, 4, ColorChoice::Random),
            None,
            &mut StdRng::seed_from_u64(7),
        )
        .expect("game starts");
    let game = phase.game_mut().expect("active game");
    assert_eq!(game.bot(), None);

    game.play(mv("e2e4")).expect("white moves");
    game.play(mv("e7e5")).expect("black moves");
    assert!(!game.is_thinking());
    assert_eq!(game.poll_bot_move(), Ok(BotTurn::Idle));
    assert_eq!(game.worker_generation(), 0);
    assert_eq!(game.token().version(), 2);
}

#[tokio::test]
async fn test_start_while_active_is_rejected() {
    let engine = Arc::new(ChessEngine::new());
    let mut rng = StdRng::seed_from_u64(3);
    let mut phase = Phase::new();
    let friend = setup(Opponent::Friend, 1, ColorChoice::White);
    phase
        .start(Arc::clone(&engine), &friend, None, &mut rng)
        .expect("game starts");
    phase
        .game_mut()
        .expect("active game")
        .play(mv("d2d4"))
        .expect("legal move");

    let err = phase
        .start(engine, &friend, None, &mut rng)
        .expect_err("already active");
    assert_eq!(err, GameError::AlreadyActive);
    assert_eq!(phase.game().expect("still active").token().version(), 1);
}

#[tokio::test]
async fn test_invalid_start_position_stays_in_setup() {
    let mut phase = Phase::new();
    let err = phase
        .start(
            Arc::new(ChessEngine::new()),
            &GameSetup::default(),
            Some("garbage"),
            &mut StdRng::seed_from_u64(0),
        )
        .expect_err("bad FEN");
    assert!(matches!(err, GameError::Engine(_)));
    assert!(!phase.is_active());
}

#[test]
fn test_random_colour_is_resolved_from_injected_rng() {
    let random = setup(Opponent::Engine, 3, ColorChoice::Random);
    let first = random.resolve(&mut StdRng::seed_from_u64(42));
    let again = random.resolve(&mut StdRng::seed_from_u64(42));
    assert_eq!(first, again);

    let mut rng = StdRng::seed_from_u64(11);
    let sides: std::collections::HashSet<Side> = (0..64)
        .filter_map(|_| random.resolve(&mut rng))
        .map(|bot| bot.side)
        .collect();
    assert_eq!(sides.len(), 2);

    for color in ColorChoice::iter() {
        let bot = setup(Opponent::Engine, 3, color)
            .resolve(&mut rng)
            .expect("engine opponent");
        assert_eq!(bot.depth, 4);
        match color {
            ColorChoice::White => assert_eq!(bot.side, Side::Black),
            ColorChoice::Black => assert_eq!(bot.side, Side::White),
            ColorChoice::Random => {}
        }
    }
}

#[tokio::test]
async fn test_cancel_and_retry_spawns_fresh_worker() {
    let engine = Arc::new(GatedEngine::default());
    let bot = BotConfig {
        depth: 1,
        side: Side::White,
    };
    let mut game = ActiveGame::new(Arc::clone(&engine), Some(bot), None).expect("game starts");
    assert!(wait_until(|| engine.started() == 1).await);

    assert!(game.cancel_query());
    assert_eq!(game.pending_status(), None);
    assert!(game.is_automated_turn());
    assert_eq!(game.token().version(), 0);
    assert_eq!(game.next_bot_move().await, Ok(BotTurn::Idle));

    game.retry_query().expect("query dispatched");
    assert!(game.is_thinking());
    assert_eq!(game.worker_generation(), 2);

    engine.release();
    let turn = timeout(TIMEOUT, game.next_bot_move())
        .await
        .expect("engine timed out")
        .expect("engine move applies");
    assert!(matches!(turn, BotTurn::Moved(_)));
    assert_eq!(game.token().version(), 1);
}

#[tokio::test]
async fn test_dropping_the_phase_cancels_the_search() {
    let engine = Arc::new(GatedEngine::default());
    let mut phase = Phase::new();
    phase
        .start(
            Arc::clone(&engine),
            &setup(Opponent::Engine, 2, ColorChoice::Black),
            None,
            &mut StdRng::seed_from_u64(5),
        )
        .expect("game starts");
    assert!(phase.game().expect("active game").is_thinking());
    assert!(wait_until(|| engine.started() == 1).await);

    phase = Phase::new();
    assert!(!phase.is_active());
    assert!(wait_until(|| engine.aborted() == 1).await);
}

/// Standard chess whose move list becomes unreadable once a move is played.
#[derive(Debug, Default)]
struct GarbledEngine(ChessEngine);

struct GarbledPosition {
    inner: ChessPosition,
    moves_played: u32,
}

impl EnginePosition for GarbledPosition {
    fn side_to_move_is_white(&self) -> bool {
        self.inner.side_to_move_is_white()
    }

    fn board_text(&self) -> String {
        self.inner.board_text()
    }

    fn legal_moves_text(&self) -> String {
        if self.moves_played > 0 {
            "e7e5 e7e".to_string()
        } else {
            self.inner.legal_moves_text()
        }
    }

    fn apply_move_text(&mut self, text: &str) -> Result<(), EngineError> {
        self.inner.apply_move_text(text)?;
        self.moves_played += 1;
        Ok(())
    }

    fn to_position_text(&self) -> String {
        self.inner.to_position_text()
    }

    fn status(&self) -> GameStatus {
        self.inner.status()
    }

    fn evaluate(&self) -> i32 {
        self.inner.evaluate()
    }
}

impl Engine for GarbledEngine {
    type Position = GarbledPosition;

    fn new_position(&self, text: Option<&str>) -> Result<GarbledPosition, EngineError> {
        Ok(GarbledPosition {
            inner: self.0.new_position(text)?,
            moves_played: 0,
        })
    }

    fn search(
        &self,
        position: &mut GarbledPosition,
        depth: u32,
        stop: &AtomicBool,
    ) -> Result<SearchReport, EngineError> {
        self.0.search(&mut position.inner, depth, stop)
    }
}

#[tokio::test]
async fn test_unreadable_move_list_clears_legality_index() {
    let mut game =
        ActiveGame::new(Arc::new(GarbledEngine::default()), None, None).expect("game starts");
    assert_eq!(game.legality().move_count(), 20);

    let err = game.play(mv("e2e4")).expect_err("index cannot be rebuilt");
    assert!(matches!(
        err,
        GameError::Wire(WireError::MalformedToken { .. })
    ));
    assert_eq!(game.token().version(), 1);
    assert!(game.legality().is_empty());

    // Moves from the previous position no longer validate.
    assert_eq!(
        game.play(mv("d2d4")),
        Err(GameError::NotLegal { mv: mv("d2d4") })
    );
    assert_eq!(
        game.play(mv("e7e5")),
        Err(GameError::NotLegal { mv: mv("e7e5") })
    );
    assert!(matches!(game.retry_query(), Err(GameError::Wire(_))));
    assert!(game.legality().is_empty());
}
