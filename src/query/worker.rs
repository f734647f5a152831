//! Background search context: one OS thread serving search jobs in order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use super::pending::{QueryState, Reply};
use super::{QueryError, QueryRequest};
use crate::engine::Engine;

/// A request travelling to the worker together with its reply channel.
#[derive(Debug)]
pub(crate) struct SearchJob {
    request: QueryRequest,
    state: Arc<QueryState>,
    reply: oneshot::Sender<Reply>,
}

impl SearchJob {
    pub(crate) fn new(
        request: QueryRequest,
        state: Arc<QueryState>,
        reply: oneshot::Sender<Reply>,
    ) -> Self {
        Self {
            request,
            state,
            reply,
        }
    }

    /// Posts `result` unless the query was cancelled first.
    pub(crate) fn deliver(self, result: Reply) {
        if !self.state.mark_delivered() {
            debug!(query_id = self.state.id(), "Discarding result of cancelled query");
            return;
        }
        if self.reply.send(result).is_err() {
            debug!(query_id = self.state.id(), "Query handle dropped before delivery");
        }
    }
}

/// Handle to a running search thread.
///
/// Dropping the handle raises the abort flag and closes the job channel; the
/// thread exits after its current search unwinds.
#[derive(Debug)]
pub(crate) struct SearchWorker {
    generation: u64,
    jobs: mpsc::UnboundedSender<SearchJob>,
    abort: Arc<AtomicBool>,
}

impl SearchWorker {
    /// Starts a new search thread.
    ///
    /// # Errors
    ///
    /// [`QueryError::WorkerStartup`] if the OS refuses to create the thread.
    #[instrument(skip(engine))]
    pub(crate) fn spawn<E: Engine>(engine: Arc<E>, generation: u64) -> Result<Self, QueryError> {
        let (jobs, receiver) = mpsc::unbounded_channel();
        let abort = Arc::new(AtomicBool::new(false));
        let thread_abort = Arc::clone(&abort);
        thread::Builder::new()
            .name(format!("search-worker-{}", generation))
            .spawn(move || serve(engine, receiver, thread_abort, generation))
            .map_err(|e| {
                warn!(error = %e, "Failed to spawn search worker");
                QueryError::WorkerStartup {
                    reason: e.to_string(),
                }
            })?;
        info!(generation, "Search worker spawned");
        Ok(Self {
            generation,
            jobs,
            abort,
        })
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Whether the worker was aborted or its thread has gone away.
    pub(crate) fn is_defunct(&self) -> bool {
        self.abort.load(Ordering::Acquire) || self.jobs.is_closed()
    }

    /// Queues a job. Hands the job back if the thread is gone.
    pub(crate) fn submit(&self, job: SearchJob) -> Result<(), SearchJob> {
        self.jobs.send(job).map_err(|rejected| rejected.0)
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.abort.store(true, Ordering::Release);
        debug!(generation = self.generation, "Search worker released");
    }
}

fn serve<E: Engine>(
    engine: Arc<E>,
    mut jobs: mpsc::UnboundedReceiver<SearchJob>,
    abort: Arc<AtomicBool>,
    generation: u64,
) {
    debug!(generation, "Search worker running");
    while let Some(job) = jobs.blocking_recv() {
        if abort.load(Ordering::Acquire) {
            break;
        }
        let result = execute(engine.as_ref(), &job.request, &abort);
        if abort.load(Ordering::Acquire) {
            debug!(generation, "Worker aborted during search");
            break;
        }
        job.deliver(result);
    }
    info!(generation, "Search worker exiting");
}

#[instrument(skip(engine, abort), fields(depth = request.depth))]
fn execute<E: Engine>(engine: &E, request: &QueryRequest, abort: &AtomicBool) -> Reply {
    let mut position = engine.new_position(Some(&request.position_text))?;
    let report = engine.search(&mut position, request.depth, abort)?;
    Ok(report.into())
}
