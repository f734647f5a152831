//! Request/response messages exchanged with the background search context.

use serde::{Deserialize, Serialize};

use crate::engine::SearchReport;

/// One search request: a position snapshot and a depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Serialized position (FEN for the standard engine).
    pub position_text: String,
    /// Search depth in plies.
    pub depth: u32,
}

impl QueryRequest {
    /// Creates a request.
    pub fn new(position_text: impl Into<String>, depth: u32) -> Self {
        Self {
            position_text: position_text.into(),
            depth,
        }
    }
}

/// One search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Score from the side to move's perspective.
    pub score: i32,
    /// Chosen move token, absent in terminal positions.
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub best_move: Option<String>,
    /// Nodes visited by the search.
    pub nodes_searched: u64,
}

impl From<SearchReport> for QueryResponse {
    fn from(report: SearchReport) -> Self {
        Self {
            score: report.score,
            best_move: report.best_move,
            nodes_searched: report.nodes_searched,
        }
    }
}
