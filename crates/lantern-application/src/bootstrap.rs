//! Composition root: wires the store, persistence, orchestrator and services.

use crate::autosave::AutosaveService;
use crate::generation::{GenerationOrchestrator, OrchestratorSettings};
use crate::session::ConversationService;
use anyhow::{Context, Result};
use lantern_core::config::LanternConfig;
use lantern_core::inference::InferenceAdapter;
use lantern_core::model::ModelProvider;
use lantern_core::persistence::StorageBackend;
use lantern_core::session::{ConversationStore, SharedConversationStore};
use lantern_infrastructure::{FileStorage, LanternPaths, PersistenceAdapter, SessionPersistence};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The running application services.
pub struct LanternApp {
    pub config: LanternConfig,
    pub store: SharedConversationStore,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub conversations: Arc<ConversationService>,
    pub autosave: Arc<AutosaveService>,
    /// Whether persisted sessions were restored on boot; drives the
    /// recovery notice.
    pub recovered: bool,
    shutdown: CancellationToken,
    autosave_task: JoinHandle<()>,
}

impl LanternApp {
    /// Stops background tasks after a final flush.
    pub async fn shutdown(self) {
        tracing::info!("[Bootstrap] Shutting down");
        self.shutdown.cancel();
        if let Err(e) = self.autosave_task.await {
            tracing::warn!("[Bootstrap] Autosave task ended abnormally: {}", e);
        }
    }
}

/// File storage under the configured (or platform) data directory.
pub fn file_backend(config: &LanternConfig) -> Result<Arc<dyn StorageBackend>> {
    let dir = LanternPaths::store_dir(config.persistence.data_dir.as_ref())
        .context("Failed to resolve store directory")?;
    tracing::info!("[Bootstrap] Using store directory: {}", dir.display());
    Ok(Arc::new(FileStorage::new(dir)))
}

/// Restores persisted state and starts the application services.
///
/// Must be called from within a tokio runtime.
pub async fn bootstrap(
    config: LanternConfig,
    backend: Arc<dyn StorageBackend>,
    adapter: Arc<dyn InferenceAdapter>,
    models: Arc<dyn ModelProvider>,
) -> LanternApp {
    let adapter_budget = config.persistence.latency_budget();
    let persistence = SessionPersistence::new(
        PersistenceAdapter::new(backend).with_latency_budget(adapter_budget),
    )
    .with_key(config.persistence.storage_key.clone());

    let mut store = ConversationStore::new();
    let recovered = match persistence.load().await {
        Some(state) => store.initialize_sessions(state),
        None => false,
    };
    tracing::info!(
        "[Bootstrap] Conversation store ready: {} session(s), recovered={}",
        store.len(),
        recovered
    );
    let store = store.into_shared();

    let orchestrator = Arc::new(GenerationOrchestrator::new(
        store.clone(),
        adapter,
        models,
        OrchestratorSettings::from(&config.generation),
    ));
    let conversations = Arc::new(ConversationService::new(
        store.clone(),
        config.generation.undo_window(),
    ));
    let autosave = Arc::new(AutosaveService::new(
        store.clone(),
        persistence,
        config.persistence.autosave_debounce(),
    ));

    let shutdown = CancellationToken::new();
    let autosave_task = Arc::clone(&autosave).spawn(shutdown.clone());

    LanternApp {
        config,
        store,
        orchestrator,
        conversations,
        autosave,
        recovered,
        shutdown,
        autosave_task,
    }
}
