#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::{mpsc, oneshot};
use lantern_application::generation::{
    GenerationOrchestrator, GenerationState, OrchestratorSettings,
};
use lantern_core::inference::{
    AdapterError, GenerationParams, InferenceAdapter, ModelStatus, TokenChunk, TokenStream,
};
use lantern_core::model::ModelMetadata;
use lantern_core::session::{ConversationStore, SharedConversationStore};
use lantern_infrastructure::StaticModelProvider;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type ChunkSender = mpsc::UnboundedSender<Result<TokenChunk, AdapterError>>;

/// Releases a held `load_model` call with the given result.
pub type LoadGate = oneshot::Sender<Result<(), AdapterError>>;

/// What the next `generate` call produces.
pub enum Script {
    Chunks(Vec<Result<TokenChunk, AdapterError>>),
    Channel(mpsc::UnboundedReceiver<Result<TokenChunk, AdapterError>>),
    Fail(AdapterError),
}

impl Script {
    pub fn text(parts: &[&str]) -> Self {
        Self::Chunks(parts.iter().map(|p| Ok(TokenChunk::new(*p))).collect())
    }

    pub fn channel() -> (ChunkSender, Self) {
        let (tx, rx) = mpsc::unbounded();
        (tx, Self::Channel(rx))
    }
}

/// Scripted adapter that records every call in order.
pub struct MockAdapter {
    calls: Mutex<Vec<String>>,
    loaded: AtomicBool,
    load_error: Mutex<Option<AdapterError>>,
    load_gate: Mutex<Option<oneshot::Receiver<Result<(), AdapterError>>>>,
    scripts: Mutex<VecDeque<Script>>,
}

impl MockAdapter {
    pub fn new(loaded: bool) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            loaded: AtomicBool::new(loaded),
            load_error: Mutex::new(None),
            load_gate: Mutex::new(None),
            scripts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_script(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn fail_load_with(&self, error: AdapterError) {
        *self.load_error.lock().unwrap() = Some(error);
    }

    /// Makes the next `load_model` wait until the returned gate is used.
    pub fn hold_load(&self) -> LoadGate {
        let (tx, rx) = oneshot::channel();
        *self.load_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl InferenceAdapter for MockAdapter {
    async fn generate(&self, params: GenerationParams) -> Result<TokenStream, AdapterError> {
        self.record(format!("generate:{}", params.model_id));
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::text(&["ok"]));
        match script {
            Script::Chunks(items) => Ok(futures::stream::iter(items).boxed()),
            Script::Channel(rx) => Ok(rx.boxed()),
            Script::Fail(error) => Err(error),
        }
    }

    async fn abort(&self) -> Result<(), AdapterError> {
        self.record("abort");
        Ok(())
    }

    async fn is_model_loaded(&self) -> bool {
        self.record("is_model_loaded");
        self.loaded.load(Ordering::SeqCst)
    }

    async fn load_model(&self, model_id: &str) -> Result<(), AdapterError> {
        self.record(format!("load_model:{}", model_id));
        let gate = self.load_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.await.unwrap_or(Ok(()))?;
        }
        if let Some(error) = self.load_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn status(&self) -> ModelStatus {
        if self.loaded.load(Ordering::SeqCst) {
            ModelStatus::Loaded
        } else {
            ModelStatus::Unloaded
        }
    }
}

pub fn catalog() -> Vec<ModelMetadata> {
    vec![
        ModelMetadata::new("medium", "Medium", 4_000, 8_000, 12_000),
        ModelMetadata::new("tiny", "Tiny", 1_000, 2_000, 3_000),
    ]
}

pub struct Harness {
    pub store: SharedConversationStore,
    pub adapter: Arc<MockAdapter>,
    pub models: Arc<StaticModelProvider>,
    pub orchestrator: Arc<GenerationOrchestrator>,
}

impl Harness {
    pub fn new(adapter: MockAdapter, models: StaticModelProvider) -> Self {
        let store = ConversationStore::new().into_shared();
        let adapter = Arc::new(adapter);
        let models = Arc::new(models);
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            store.clone(),
            adapter.clone(),
            models.clone(),
            OrchestratorSettings::default(),
        ));
        Self {
            store,
            adapter,
            models,
            orchestrator,
        }
    }

    /// Unloaded adapter and a single downloaded model.
    pub fn with_tiny_model() -> Self {
        Self::new(
            MockAdapter::new(false),
            StaticModelProvider::new(catalog()).with_downloaded(["tiny"]),
        )
    }

    /// Waits until the orchestrator publishes `state`.
    pub async fn wait_for_state(&self, state: GenerationState) {
        let mut states = self.orchestrator.subscribe_state();
        tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == state))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {}", state))
            .unwrap();
    }

    /// Waits until the streaming snapshot shows `content`.
    pub async fn wait_for_content(&self, content: &str) {
        let mut snapshots = self.orchestrator.subscribe_streaming();
        let wait = async {
            loop {
                let reached = snapshots
                    .borrow_and_update()
                    .as_ref()
                    .is_some_and(|s| s.content == content);
                if reached {
                    return;
                }
                snapshots.changed().await.unwrap();
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {:?}", content));
    }
}
