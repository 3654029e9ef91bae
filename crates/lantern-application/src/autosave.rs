//! Debounced background flushing of the conversation store.
//!
//! Every store mutation bumps its revision; the autosave task waits for a
//! change, lets further changes settle for the debounce window and writes one
//! snapshot. Writes never block the caller that mutated the store, and a
//! failed write only logs a warning and leaves the store dirty.

use chrono::Utc;
use lantern_core::session::SharedConversationStore;
use lantern_infrastructure::SessionPersistence;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct AutosaveService {
    store: SharedConversationStore,
    persistence: SessionPersistence,
    debounce: Duration,
}

impl AutosaveService {
    pub fn new(
        store: SharedConversationStore,
        persistence: SessionPersistence,
        debounce: Duration,
    ) -> Self {
        Self {
            store,
            persistence,
            debounce,
        }
    }

    /// Writes the current snapshot if the store is dirty.
    ///
    /// Returns `false` only when a write was attempted and failed.
    pub async fn flush_now(&self) -> bool {
        let (revision, state) = {
            let store = self.store.read().await;
            if !store.is_dirty() {
                return true;
            }
            store.snapshot()
        };

        match self.persistence.save(&state).await {
            Ok(()) => {
                let cleared = self.store.write().await.mark_saved(revision, Utc::now());
                tracing::debug!(
                    "[Autosave] Flushed revision {} ({} session(s)), clean={}",
                    revision,
                    state.sessions.len(),
                    cleared
                );
                true
            }
            Err(e) => {
                tracing::warn!("[Autosave] Failed to persist state: {}", e);
                false
            }
        }
    }

    /// Starts the background flusher.
    ///
    /// The task performs a final flush when `shutdown` is cancelled.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut changes = self.store.read().await.subscribe();
            tracing::info!("[Autosave] Started (debounce {:?})", self.debounce);

            // Anything mutated before the subscription existed.
            self.flush_now().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.debounce) => {}
                }
                changes.borrow_and_update();
                self.flush_now().await;
            }

            self.flush_now().await;
            tracing::info!("[Autosave] Stopped");
        })
    }
}
