//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use strictly_chess::{ChessEngine, ChessPosition, Engine, EngineError, SearchReport};

/// Black to move and stalemated.
pub const STALEMATE_FEN: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

/// Black to move and checkmated on the back rank.
pub const CHECKMATE_FEN: &str = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1";

/// White to move, Ra8 mates.
pub const MATE_IN_ONE_FEN: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";

/// White pawn on a7 about to promote.
pub const PROMOTION_FEN: &str = "8/P7/8/8/8/8/8/k6K w - - 0 1";

/// Upper bound for anything a test awaits.
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Standard engine whose searches block until [`GatedEngine::release`] is
/// called or the stop flag is raised.
#[derive(Debug, Default)]
pub struct GatedEngine {
    inner: ChessEngine,
    open: Mutex<bool>,
    gate: Condvar,
    started: AtomicUsize,
    aborted: AtomicUsize,
}

impl GatedEngine {
    /// Lets every current and future search run.
    pub fn release(&self) {
        *self.open.lock().expect("gate lock poisoned") = true;
        self.gate.notify_all();
    }

    /// Searches that have begun.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Searches that observed the stop flag while gated.
    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl Engine for GatedEngine {
    type Position = ChessPosition;

    fn new_position(&self, text: Option<&str>) -> Result<ChessPosition, EngineError> {
        self.inner.new_position(text)
    }

    fn search(
        &self,
        position: &mut ChessPosition,
        depth: u32,
        stop: &AtomicBool,
    ) -> Result<SearchReport, EngineError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock().expect("gate lock poisoned");
        while !*open {
            if stop.load(Ordering::SeqCst) {
                self.aborted.fetch_add(1, Ordering::SeqCst);
                return Err(EngineError::SearchAborted);
            }
            open = self
                .gate
                .wait_timeout(open, Duration::from_millis(5))
                .expect("gate lock poisoned")
                .0;
        }
        drop(open);
        self.inner.search(position, depth, stop)
    }
}

/// Polls `condition` every millisecond until it holds or [`TIMEOUT`] passes.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    condition()
}
