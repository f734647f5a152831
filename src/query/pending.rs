//! The foreground half of an in-flight query.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tokio::sync::{Notify, oneshot};
use tracing::{debug, instrument};

use super::{QueryError, QueryRequest, QueryResponse};

pub(crate) type Reply = Result<QueryResponse, QueryError>;

/// Lifecycle of one query. Transitions only move forward:
/// `Pending -> Delivered -> Finished`, or `Pending | Delivered -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Dispatched, no answer yet.
    Pending,
    /// The worker has posted an answer that has not been consumed.
    Delivered,
    /// The answer was handed to the caller.
    Finished,
    /// Cancelled before the answer was consumed.
    Cancelled,
}

impl QueryStatus {
    /// Whether the query still occupies the coordinator's single slot.
    pub fn is_outstanding(self) -> bool {
        matches!(self, QueryStatus::Pending | QueryStatus::Delivered)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => QueryStatus::Pending,
            1 => QueryStatus::Delivered,
            2 => QueryStatus::Finished,
            _ => QueryStatus::Cancelled,
        }
    }
}

/// State shared between the foreground handle, the coordinator and the worker.
#[derive(Debug)]
pub(crate) struct QueryState {
    id: u64,
    status: AtomicU8,
    worker_abort: Arc<AtomicBool>,
    cancelled: Notify,
}

impl QueryState {
    pub(crate) fn new(id: u64, worker_abort: Arc<AtomicBool>) -> Self {
        Self {
            id,
            status: AtomicU8::new(QueryStatus::Pending as u8),
            worker_abort,
            cancelled: Notify::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn status(&self) -> QueryStatus {
        QueryStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn transition(&self, from: QueryStatus, to: QueryStatus) -> bool {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called by the worker before posting. Fails once cancelled.
    pub(crate) fn mark_delivered(&self) -> bool {
        self.transition(QueryStatus::Pending, QueryStatus::Delivered)
    }

    /// Called by the foreground before handing out a result. Fails once cancelled.
    fn mark_finished(&self) -> bool {
        self.transition(QueryStatus::Delivered, QueryStatus::Finished)
    }

    /// Cancels an outstanding query and raises its worker's abort flag.
    ///
    /// Returns false if the query had already finished or been cancelled.
    pub(crate) fn cancel(&self) -> bool {
        let cancelled = self.transition(QueryStatus::Pending, QueryStatus::Cancelled)
            || self.transition(QueryStatus::Delivered, QueryStatus::Cancelled);
        if cancelled {
            self.worker_abort.store(true, Ordering::Release);
            self.cancelled.notify_one();
            debug!(query_id = self.id, "Query cancelled");
        }
        cancelled
    }
}

/// Handle to one dispatched search.
///
/// Obtain the answer with [`PendingQuery::result`] (awaiting) or
/// [`PendingQuery::try_result`] (polling). Once the query is cancelled both
/// return [`QueryError::Cancelled`], even if the worker's answer already
/// arrived. Once an outcome has been handed out, later calls repeat it.
#[derive(Debug)]
pub struct PendingQuery {
    state: Arc<QueryState>,
    reply: oneshot::Receiver<Reply>,
    request: QueryRequest,
    settled: Option<Reply>,
}

impl PendingQuery {
    pub(crate) fn new(
        state: Arc<QueryState>,
        reply: oneshot::Receiver<Reply>,
        request: QueryRequest,
    ) -> Self {
        Self {
            state,
            reply,
            request,
            settled: None,
        }
    }

    /// Coordinator-assigned id.
    pub fn id(&self) -> u64 {
        self.state.id()
    }

    /// The request that was dispatched.
    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    /// Current lifecycle state.
    pub fn status(&self) -> QueryStatus {
        self.state.status()
    }

    /// Cancels the query. Returns false if it had already completed.
    pub fn cancel(&self) -> bool {
        self.state.cancel()
    }

    /// Waits for the answer.
    ///
    /// # Errors
    ///
    /// [`QueryError::Cancelled`] if the query is or becomes cancelled, or the
    /// worker's error otherwise.
    #[instrument(skip(self), fields(query_id = self.id()))]
    pub async fn result(&mut self) -> Result<QueryResponse, QueryError> {
        if let Some(settled) = &self.settled {
            return settled.clone();
        }
        if self.state.status() == QueryStatus::Cancelled {
            return Err(QueryError::Cancelled);
        }
        let received = tokio::select! {
            received = &mut self.reply => received.ok(),
            () = self.state.cancelled.notified() => return Err(QueryError::Cancelled),
        };
        self.settle(received)
    }

    /// Returns the answer if one is available, without waiting.
    pub fn try_result(&mut self) -> Option<Result<QueryResponse, QueryError>> {
        if let Some(settled) = &self.settled {
            return Some(settled.clone());
        }
        match self.reply.try_recv() {
            Ok(reply) => Some(self.settle(Some(reply))),
            Err(oneshot::error::TryRecvError::Empty) => {
                (self.state.status() == QueryStatus::Cancelled).then_some(Err(QueryError::Cancelled))
            }
            Err(oneshot::error::TryRecvError::Closed) => Some(self.settle(None)),
        }
    }

    /// Resolves the reply channel's outcome and records it; the channel is
    /// never polled again afterwards.
    fn settle(&mut self, received: Option<Reply>) -> Result<QueryResponse, QueryError> {
        let outcome = match received {
            Some(reply) if self.state.mark_finished() => reply,
            Some(_) => {
                debug!(query_id = self.id(), "Dropping answer of cancelled query");
                Err(QueryError::Cancelled)
            }
            // The sender vanished without posting: either we were cancelled or
            // the worker died. Retire the query so the slot frees up.
            None if self.state.cancel() => Err(QueryError::WorkerLost),
            None => Err(QueryError::Cancelled),
        };
        self.settled = Some(outcome.clone());
        outcome
    }
}
