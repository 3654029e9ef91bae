//! The transient record of one in-flight turn.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Identifies the message a turn is writing into and carries its
/// cancellation token.
///
/// `message_id` always names a message already present in the store.
#[derive(Debug)]
pub struct GenerationContext {
    pub session_id: String,
    pub message_id: String,
    pub model_id: String,
    /// Orchestrator epoch the turn was started in.
    pub epoch: u64,
    pub started_at: DateTime<Utc>,
    started: Instant,
    token: CancellationToken,
    /// Increments applied to the store so far.
    tokens: AtomicUsize,
}

impl GenerationContext {
    pub fn new(session_id: String, message_id: String, model_id: String, epoch: u64) -> Self {
        Self {
            session_id,
            message_id,
            model_id,
            epoch,
            started_at: Utc::now(),
            started: Instant::now(),
            token: CancellationToken::new(),
            tokens: AtomicUsize::new(0),
        }
    }

    /// Raises the abort flag. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the turn is aborted.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Counts one applied increment and returns the new total.
    ///
    /// Callers hold the store write lock, so the count is stable for anyone
    /// finalizing under the same lock after cancelling.
    pub fn record_token(&self) -> usize {
        self.tokens.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn token_count(&self) -> usize {
        self.tokens.load(Ordering::SeqCst)
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
