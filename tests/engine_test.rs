//! Tests for the standard chess engine behind the engine boundary.

mod common;

use std::sync::atomic::AtomicBool;

use common::{CHECKMATE_FEN, MATE_IN_ONE_FEN, PROMOTION_FEN, STALEMATE_FEN};
use strictly_chess::{ChessEngine, Engine, EngineError, EnginePosition, GameStatus, MATE_SCORE};

#[test]
fn test_board_text_starts_with_rank_eight() {
    let position = ChessEngine::new().new_position(None).expect("start position");
    let board = position.board_text();
    let rows: Vec<&str> = board.lines().collect();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0], "r n b q k b n r");
    assert_eq!(rows[1], "p p p p p p p p");
    assert_eq!(rows[4], ". . . . . . . .");
    assert_eq!(rows[7], "R N B Q K B N R");
    assert!(position.side_to_move_is_white());
    assert_eq!(position.status(), GameStatus::Ongoing);
}

#[test]
fn test_search_finds_mate_in_one() {
    let engine = ChessEngine::new();
    let mut position = engine.new_position(Some(MATE_IN_ONE_FEN)).expect("valid");
    let report = engine
        .search(&mut position, 2, &AtomicBool::new(false))
        .expect("search completes");
    assert_eq!(report.best_move.as_deref(), Some("a1a8"));
    assert_eq!(report.score, MATE_SCORE - 1);
    assert!(report.nodes_searched > 1);

    position.apply_move_text("a1a8").expect("mating move");
    assert_eq!(
        position.status(),
        GameStatus::Checkmate { white_wins: true }
    );
    assert!(position.status().is_over());
}

#[test]
fn test_terminal_statuses() {
    let engine = ChessEngine::new();
    let stalemate = engine.new_position(Some(STALEMATE_FEN)).expect("valid");
    assert_eq!(stalemate.status(), GameStatus::Stalemate);
    assert_eq!(stalemate.legal_moves_text(), "");

    let mut mated = engine.new_position(Some(CHECKMATE_FEN)).expect("valid");
    assert_eq!(mated.status(), GameStatus::Checkmate { white_wins: true });
    assert_eq!(mated.status().label(), "Checkmate, white wins");

    let report = engine
        .search(&mut mated, 3, &AtomicBool::new(false))
        .expect("search completes");
    assert_eq!(report.best_move, None);
    assert_eq!(report.score, -MATE_SCORE);
}

#[test]
fn test_four_character_promotion_becomes_queen() {
    let engine = ChessEngine::new();
    let mut queen = engine.new_position(Some(PROMOTION_FEN)).expect("valid");
    queen.apply_move_text("a7a8").expect("auto-queen");
    assert!(queen.board_text().starts_with("Q . . . . . . ."));

    let mut knight = engine.new_position(Some(PROMOTION_FEN)).expect("valid");
    knight.apply_move_text("a7a8n").expect("explicit under-promotion");
    assert!(knight.board_text().starts_with("N . . . . . . ."));
}

#[test]
fn test_illegal_move_leaves_position_unchanged() {
    let mut position = ChessEngine::new().new_position(None).expect("start position");
    let before = position.to_position_text();
    let err = position.apply_move_text("e2e5").expect_err("not legal");
    assert_eq!(
        err,
        EngineError::IllegalMove {
            text: "e2e5".to_string()
        }
    );
    assert_eq!(position.to_position_text(), before);
}

#[test]
fn test_invalid_position_text_is_rejected() {
    let engine = ChessEngine::new();
    for bad in ["not a fen", "8/8/8/8/8/8/8/8 w - - 0 1"] {
        let err = engine.new_position(Some(bad)).expect_err("cannot decode");
        assert!(
            matches!(err, EngineError::InvalidPositionText { .. }),
            "{:?} gave {:?}",
            bad,
            err
        );
    }
}

#[test]
fn test_position_text_round_trips() {
    let engine = ChessEngine::new();
    let mut position = engine.new_position(None).expect("start position");
    position.apply_move_text("e2e4").expect("legal");
    let text = position.to_position_text();
    let copy = engine.new_position(Some(&text)).expect("snapshot decodes");
    assert_eq!(copy.to_position_text(), text);
    assert_eq!(copy.board_text(), position.board_text());
    assert!(!copy.side_to_move_is_white());
}

#[test]
fn test_raised_stop_flag_aborts_search() {
    let engine = ChessEngine::new();
    let mut position = engine.new_position(None).expect("start position");
    let err = engine
        .search(&mut position, 3, &AtomicBool::new(true))
        .expect_err("stopped before starting");
    assert_eq!(err, EngineError::SearchAborted);
}

#[test]
fn test_start_position_is_balanced() {
    let position = ChessEngine::new().new_position(None).expect("start position");
    assert_eq!(position.evaluate(), 0);
}
