//! Tests for the background query coordinator.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{GatedEngine, STALEMATE_FEN, TIMEOUT, wait_until};
use strictly_chess::{
    ChessEngine, Engine, EngineError, EnginePosition, LegalityIndex, Move, QueryCoordinator,
    QueryError, QueryRequest, QueryResponse, QueryStatus,
};
use tokio::time::timeout;

fn start_text() -> String {
    ChessEngine::new()
        .new_position(None)
        .expect("start position")
        .to_position_text()
}

#[tokio::test]
async fn test_query_resolves_with_legal_move() {
    let engine = Arc::new(ChessEngine::new());
    let mut coordinator = QueryCoordinator::new(Arc::clone(&engine));

    let mut query = coordinator
        .start_query(start_text(), 2)
        .expect("start query");
    assert_eq!(query.request().depth, 2);

    let response = timeout(TIMEOUT, query.result())
        .await
        .expect("query timed out")
        .expect("query failed");

    let position = engine.new_position(None).expect("start position");
    let index = LegalityIndex::build(&position.legal_moves_text(), true).expect("index");
    let token = response.best_move.expect("start position has moves");
    assert!(index.allows(Move::from_token(&token).expect("four-character token")));
    assert!(response.nodes_searched > 0);

    assert_eq!(query.status(), QueryStatus::Finished);
    assert!(!coordinator.has_pending());
    assert_eq!(coordinator.worker_generation(), 1);
}

#[tokio::test]
async fn test_result_can_be_read_again_after_completion() {
    let mut coordinator = QueryCoordinator::new(Arc::new(ChessEngine::new()));

    let mut query = coordinator.start_query(start_text(), 1).expect("start query");
    let first = timeout(TIMEOUT, query.result())
        .await
        .expect("query timed out")
        .expect("query failed");
    let again = timeout(TIMEOUT, query.result())
        .await
        .expect("finished query must not wait")
        .expect("finished query keeps its answer");
    assert_eq!(again, first);
    assert_eq!(query.try_result(), Some(Ok(first)));
    assert_eq!(query.status(), QueryStatus::Finished);
}

#[tokio::test]
async fn test_result_after_polled_answer() {
    let mut coordinator = QueryCoordinator::new(Arc::new(ChessEngine::new()));

    let mut query = coordinator.start_query(start_text(), 1).expect("start query");
    let polled = timeout(TIMEOUT, async {
        loop {
            if let Some(result) = query.try_result() {
                return result;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("query timed out")
    .expect("query failed");

    let awaited = timeout(TIMEOUT, query.result())
        .await
        .expect("finished query must not wait")
        .expect("finished query keeps its answer");
    assert_eq!(awaited, polled);
    assert!(!query.cancel());
}

#[tokio::test]
async fn test_second_query_rejected_while_pending() {
    let engine = Arc::new(GatedEngine::default());
    let mut coordinator = QueryCoordinator::new(Arc::clone(&engine));

    let mut first = coordinator.start_query(start_text(), 1).expect("first query");
    let err = coordinator
        .start_query(start_text(), 1)
        .expect_err("second query must be rejected");
    assert_eq!(err, QueryError::AlreadyPending { id: first.id() });
    assert!(!err.is_cancelled());

    engine.release();
    let response = timeout(TIMEOUT, first.result())
        .await
        .expect("query timed out");
    assert!(response.is_ok());

    // The slot is free again once the first query finished.
    assert!(coordinator.start_query(start_text(), 1).is_ok());
}

#[tokio::test]
async fn test_cancel_before_response_never_resolves() {
    let engine = Arc::new(GatedEngine::default());
    let mut coordinator = QueryCoordinator::new(Arc::clone(&engine));

    let mut query = coordinator.start_query(start_text(), 1).expect("start query");
    assert!(wait_until(|| engine.started() == 1).await);

    assert!(coordinator.cancel());
    assert_eq!(query.status(), QueryStatus::Cancelled);
    assert!(!coordinator.has_pending());

    let err = timeout(TIMEOUT, query.result())
        .await
        .expect("cancelled query must not hang")
        .expect_err("cancelled query must not resolve");
    assert!(err.is_cancelled());

    // The torn-down worker notices the abort; opening the gate afterwards changes nothing.
    assert!(wait_until(|| engine.aborted() == 1).await);
    engine.release();
    assert!(matches!(query.try_result(), Some(Err(QueryError::Cancelled))));
    assert_eq!(query.status(), QueryStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_after_delivery_discards_result() {
    let mut coordinator = QueryCoordinator::new(Arc::new(ChessEngine::new()));

    let mut query = coordinator.start_query(start_text(), 1).expect("start query");
    assert!(wait_until(|| query.status() == QueryStatus::Delivered).await);

    assert!(query.cancel());
    assert!(!query.cancel());
    let err = query.result().await.expect_err("result arrived after cancel");
    assert_eq!(err, QueryError::Cancelled);
}

#[tokio::test]
async fn test_worker_reused_until_cancelled() {
    let mut coordinator = QueryCoordinator::new(Arc::new(ChessEngine::new()));

    for _ in 0..2 {
        let mut query = coordinator.start_query(start_text(), 1).expect("start query");
        timeout(TIMEOUT, query.result())
            .await
            .expect("query timed out")
            .expect("query failed");
    }
    assert_eq!(coordinator.worker_generation(), 1);

    let _cancelled = coordinator.start_query(start_text(), 3).expect("start query");
    assert!(coordinator.cancel());
    assert!(!coordinator.cancel());

    let mut query = coordinator.start_query(start_text(), 1).expect("start query");
    assert_eq!(coordinator.worker_generation(), 2);
    assert!(timeout(TIMEOUT, query.result()).await.expect("timed out").is_ok());
}

#[tokio::test]
async fn test_cancel_through_handle_frees_slot() {
    let engine = Arc::new(GatedEngine::default());
    let mut coordinator = QueryCoordinator::new(Arc::clone(&engine));

    let query = coordinator.start_query(start_text(), 1).expect("start query");
    assert!(query.cancel());
    assert!(!coordinator.has_pending());

    engine.release();
    let mut next = coordinator.start_query(start_text(), 1).expect("slot is free");
    assert_eq!(coordinator.worker_generation(), 2);
    assert!(timeout(TIMEOUT, next.result()).await.expect("timed out").is_ok());
}

#[tokio::test]
async fn test_invalid_snapshot_is_a_search_error() {
    let mut coordinator = QueryCoordinator::new(Arc::new(ChessEngine::new()));

    let mut query = coordinator.start_query("not a position", 1).expect("start query");
    let err = timeout(TIMEOUT, query.result())
        .await
        .expect("query timed out")
        .expect_err("snapshot cannot be decoded");
    assert!(!err.is_cancelled());
    assert!(matches!(
        err,
        QueryError::Search {
            error: EngineError::InvalidPositionText { .. }
        }
    ));
}

#[tokio::test]
async fn test_terminal_snapshot_resolves_without_move() {
    let mut coordinator = QueryCoordinator::new(Arc::new(ChessEngine::new()));

    let mut query = coordinator.start_query(STALEMATE_FEN, 2).expect("start query");
    let response = timeout(TIMEOUT, query.result())
        .await
        .expect("query timed out")
        .expect("query failed");
    assert_eq!(response.best_move, None);
    assert_eq!(response.score, 0);
}

#[test]
fn test_wire_protocol_field_names() {
    let request: QueryRequest =
        serde_json::from_str(r#"{"positionText": "8/8/8/8/8/8/8/8 w - - 0 1", "depth": 3}"#)
            .expect("request parses");
    assert_eq!(request.depth, 3);
    assert_eq!(request.position_text, "8/8/8/8/8/8/8/8 w - - 0 1");

    let response = QueryResponse {
        score: 35,
        best_move: Some("e2e4".to_string()),
        nodes_searched: 120,
    };
    let json = serde_json::to_value(&response).expect("serializes");
    assert_eq!(
        json,
        serde_json::json!({"score": 35, "move": "e2e4", "nodesSearched": 120})
    );

    let terminal = QueryResponse {
        score: 0,
        best_move: None,
        nodes_searched: 1,
    };
    let json = serde_json::to_value(&terminal).expect("serializes");
    assert_eq!(json, serde_json::json!({"score": 0, "nodesSearched": 1}));
    let back: QueryResponse = serde_json::from_value(json).expect("deserializes");
    assert_eq!(back, terminal);
}
