//! Latency-budgeted access to a storage backend.

use lantern_core::error::Result;
use lantern_core::persistence::StorageBackend;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default budget for a single storage operation.
pub const DEFAULT_LATENCY_BUDGET: Duration = Duration::from_millis(50);

/// Durable get/set/remove over a string key.
///
/// Every operation is timed; overruns of the latency budget are logged but
/// never fail the operation.
#[derive(Clone)]
pub struct PersistenceAdapter {
    backend: Arc<dyn StorageBackend>,
    latency_budget: Duration,
}

impl PersistenceAdapter {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            latency_budget: DEFAULT_LATENCY_BUDGET,
        }
    }

    pub fn with_latency_budget(mut self, budget: Duration) -> Self {
        self.latency_budget = budget;
        self
    }

    pub fn latency_budget(&self) -> Duration {
        self.latency_budget
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.timed("get", key, self.backend.get(key)).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.timed("set", key, self.backend.set(key, value)).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.timed("remove", key, self.backend.remove(key)).await
    }

    async fn timed<T>(&self, op: &str, key: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let started = Instant::now();
        let result = fut.await;
        let elapsed = started.elapsed();
        if elapsed > self.latency_budget {
            tracing::warn!(
                "[Persistence] {} '{}' took {:?} (budget {:?})",
                op,
                key,
                elapsed,
                self.latency_budget
            );
        } else {
            tracing::trace!("[Persistence] {} '{}' took {:?}", op, key, elapsed);
        }
        result
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("latency_budget", &self.latency_budget)
            .finish_non_exhaustive()
    }
}
