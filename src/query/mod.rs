//! Asynchronous engine queries.
//!
//! A [`QueryCoordinator`] dispatches at most one search at a time to a
//! background worker thread and hands back a [`PendingQuery`]. Cancelling a
//! query tears the worker down; a cancelled query never yields a result.

mod coordinator;
mod pending;
mod protocol;
mod worker;

pub use coordinator::QueryCoordinator;
pub use pending::{PendingQuery, QueryStatus};
pub use protocol::{QueryRequest, QueryResponse};

use crate::engine::EngineError;

/// Errors surfaced by a query.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum QueryError {
    /// The query was cancelled. Expected; not a failure.
    #[display("Query cancelled")]
    Cancelled,

    /// Another query is still outstanding.
    #[display("Query {} is still pending", id)]
    AlreadyPending {
        /// Id of the outstanding query.
        id: u64,
    },

    /// The background worker could not be started.
    #[display("Failed to start search worker: {}", reason)]
    WorkerStartup {
        /// OS error text.
        reason: String,
    },

    /// The worker went away without answering.
    #[display("Search worker terminated without a response")]
    WorkerLost,

    /// The engine failed to decode the snapshot or to search it.
    #[display("Search failed: {}", error)]
    Search {
        /// Underlying engine error.
        error: EngineError,
    },
}

impl QueryError {
    /// True for [`QueryError::Cancelled`], which callers must not report as an error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueryError::Cancelled)
    }
}

impl std::error::Error for QueryError {}

impl From<EngineError> for QueryError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::SearchAborted => QueryError::Cancelled,
            error => QueryError::Search { error },
        }
    }
}
