//! Single-slot query coordinator.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

use super::pending::{PendingQuery, QueryState};
use super::worker::{SearchJob, SearchWorker};
use super::{QueryError, QueryRequest};
use crate::engine::Engine;

/// Dispatches engine searches to a background worker, one at a time.
///
/// The worker is created on the first query and reused while queries finish
/// normally. Cancelling an outstanding query tears it down; the next query
/// spawns a fresh one.
#[derive(Debug)]
pub struct QueryCoordinator<E: Engine> {
    engine: Arc<E>,
    worker: Option<SearchWorker>,
    live: Option<Arc<QueryState>>,
    generations: u64,
    next_query_id: u64,
}

impl<E: Engine> QueryCoordinator<E> {
    /// Creates a coordinator with no worker running.
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            worker: None,
            live: None,
            generations: 0,
            next_query_id: 1,
        }
    }

    /// Dispatches a search of `snapshot` to `depth` plies.
    ///
    /// Worker failures do not fail this call; they arrive as the query's
    /// result.
    ///
    /// # Errors
    ///
    /// [`QueryError::AlreadyPending`] if the previous query has not finished
    /// or been cancelled.
    #[instrument(skip(self, snapshot))]
    pub fn start_query(
        &mut self,
        snapshot: impl Into<String>,
        depth: u32,
    ) -> Result<PendingQuery, QueryError> {
        if let Some(live) = self.live.as_ref().filter(|live| live.status().is_outstanding()) {
            warn!(query_id = live.id(), "Rejecting query while another is pending");
            return Err(QueryError::AlreadyPending { id: live.id() });
        }

        let id = self.next_query_id;
        self.next_query_id += 1;
        let request = QueryRequest::new(snapshot, depth);
        let (reply_tx, reply_rx) = oneshot::channel();

        let state;
        let undelivered = match self.acquire_worker() {
            Ok(worker) => {
                state = Arc::new(QueryState::new(id, worker.abort_flag()));
                let job = SearchJob::new(request.clone(), Arc::clone(&state), reply_tx);
                worker.submit(job).err().map(|job| (job, QueryError::WorkerLost))
            }
            Err(e) => {
                state = Arc::new(QueryState::new(id, Arc::new(AtomicBool::new(false))));
                let job = SearchJob::new(request.clone(), Arc::clone(&state), reply_tx);
                Some((job, e))
            }
        };
        if let Some((job, e)) = undelivered {
            error!(query_id = id, error = %e, "Search worker unavailable");
            self.worker = None;
            job.deliver(Err(e));
        }

        debug!(query_id = id, depth, "Query dispatched");
        self.live = Some(Arc::clone(&state));
        Ok(PendingQuery::new(state, reply_rx, request))
    }

    fn acquire_worker(&mut self) -> Result<&SearchWorker, QueryError> {
        if self.worker.as_ref().is_some_and(SearchWorker::is_defunct) {
            debug!("Discarding defunct search worker");
            self.worker = None;
        }
        if self.worker.is_none() {
            self.generations += 1;
            let worker = SearchWorker::spawn(Arc::clone(&self.engine), self.generations)?;
            self.worker = Some(worker);
        }
        self.worker.as_ref().ok_or(QueryError::WorkerLost)
    }

    /// Cancels the outstanding query, if any, and tears down its worker.
    ///
    /// Returns true if a query was actually cancelled.
    #[instrument(skip(self))]
    pub fn cancel(&mut self) -> bool {
        let Some(live) = self.live.take() else {
            return false;
        };
        if !live.cancel() {
            return false;
        }
        if let Some(worker) = self.worker.take() {
            info!(generation = worker.generation(), "Tearing down search worker");
        }
        true
    }

    /// Whether a query is outstanding.
    pub fn has_pending(&self) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| live.status().is_outstanding())
    }

    /// Number of workers spawned so far.
    pub fn worker_generation(&self) -> u64 {
        self.generations
    }
}

impl<E: Engine> Drop for QueryCoordinator<E> {
    fn drop(&mut self) {
        self.cancel();
    }
}
