//! The generation orchestrator.
//!
//! Drives one user turn end to end: ensure a session, resolve a model, make
//! sure it is loaded, drain the token stream into the store and finalize the
//! assistant message as completed, aborted or error.

use super::context::GenerationContext;
use super::state::{GenerationState, OrchestratorError, StreamingSnapshot, TurnOutcome};
use futures::StreamExt;
use lantern_core::config::GenerationConfig;
use lantern_core::inference::{
    AdapterError, FailurePhase, GenerationError, GenerationParams, InferenceAdapter,
};
use lantern_core::model::{ModelAutoSelector, ModelProvider};
use lantern_core::session::{
    FinishReason, InferenceInfo, MessageMetadata, NewMessage, SharedConversationStore,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

type TurnResult = Result<TurnOutcome, OrchestratorError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub max_tokens: Option<usize>,
    /// Recorded as `inference.source` on completed replies.
    pub inference_source: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for OrchestratorSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            inference_source: config.inference_source.clone(),
        }
    }
}

/// How the drain loop ended.
enum Drain {
    Exhausted,
    Cancelled,
    Failed(AdapterError),
}

pub struct GenerationOrchestrator {
    store: SharedConversationStore,
    adapter: Arc<dyn InferenceAdapter>,
    models: Arc<dyn ModelProvider>,
    settings: OrchestratorSettings,
    /// The in-flight turn, if any.
    current: Mutex<Option<Arc<GenerationContext>>>,
    /// Bumped on every `start`; only the newest turn publishes state.
    epoch: AtomicU64,
    last_prompt: Mutex<Option<String>>,
    last_error: Mutex<Option<GenerationError>>,
    state: watch::Sender<GenerationState>,
    streaming: watch::Sender<Option<StreamingSnapshot>>,
}

impl GenerationOrchestrator {
    pub fn new(
        store: SharedConversationStore,
        adapter: Arc<dyn InferenceAdapter>,
        models: Arc<dyn ModelProvider>,
        settings: OrchestratorSettings,
    ) -> Self {
        let (state, _) = watch::channel(GenerationState::Idle);
        let (streaming, _) = watch::channel(None);
        Self {
            store,
            adapter,
            models,
            settings,
            current: Mutex::new(None),
            epoch: AtomicU64::new(0),
            last_prompt: Mutex::new(None),
            last_error: Mutex::new(None),
            state,
            streaming,
        }
    }

    // ============================================================================
    // Turn lifecycle
    // ============================================================================

    /// Runs one turn for `prompt` to completion.
    ///
    /// A turn still in flight is aborted first. Generation failures are
    /// reported as [`TurnOutcome::Failed`]; `Err` is reserved for store
    /// failures, e.g. the session being deleted mid-turn, and always leaves
    /// the state at [`GenerationState::Aborted`].
    pub async fn start(&self, prompt: impl Into<String>) -> TurnResult {
        let prompt = prompt.into();
        self.abort().await;

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_error.lock().await = None;
        self.publish_state(epoch, GenerationState::ResolvingModel);

        let session_id = self.ensure_session(&prompt).await;
        *self.last_prompt.lock().await = Some(prompt.clone());

        let model_id = match self.resolve_model().await {
            Ok(model_id) => model_id,
            Err(error) => return Ok(self.fail_before_messages(epoch, session_id, error).await),
        };

        let message_id = uuid::Uuid::new_v4().to_string();
        if let Err(e) = self
            .append_turn_messages(&session_id, &prompt, &message_id)
            .await
        {
            tracing::warn!(
                session_id = %session_id,
                "[Orchestrator] Turn not started, session is gone: {}",
                e
            );
            self.publish_state(epoch, GenerationState::Aborted);
            return Err(e.into());
        }

        let ctx = Arc::new(GenerationContext::new(
            session_id,
            message_id,
            model_id,
            epoch,
        ));
        {
            let mut current = self.current.lock().await;
            if let Some(previous) = current.replace(Arc::clone(&ctx)) {
                // A concurrent start slipped in; it loses.
                previous.cancel();
            }
        }
        tracing::info!(
            session_id = %ctx.session_id,
            message_id = %ctx.message_id,
            model_id = %ctx.model_id,
            "[Orchestrator] Turn started"
        );

        let outcome = match self.run_turn(&ctx, prompt).await {
            Err(err) => self.abandon(&ctx, err).await,
            outcome => outcome,
        };
        self.cleanup(&ctx).await;
        outcome
    }

    /// Stops the in-flight turn.
    ///
    /// Returns `false` when there is nothing to abort. The context's flag is
    /// raised before the engine is asked to stop, so no increment that
    /// arrives afterwards is applied.
    pub async fn abort(&self) -> bool {
        let ctx = {
            let current = self.current.lock().await;
            match current.as_ref() {
                Some(ctx) if !ctx.is_aborted() => Arc::clone(ctx),
                _ => return false,
            }
        };

        ctx.cancel();
        tracing::info!(message_id = %ctx.message_id, "[Orchestrator] Abort requested");

        if let Err(e) = self.adapter.abort().await {
            tracing::warn!("[Orchestrator] Adapter abort failed: {}", e);
        }

        {
            let mut store = self.store.write().await;
            let pending = store
                .message(&ctx.session_id, &ctx.message_id)
                .is_some_and(|m| !m.is_finalized());
            if pending {
                let metadata = MessageMetadata::new(FinishReason::Aborted)
                    .with_tokens(ctx.token_count())
                    .with_duration_ms(ctx.elapsed_ms())
                    .with_model_id(ctx.model_id.clone());
                if let Err(e) = store.finalize_message(&ctx.session_id, &ctx.message_id, metadata) {
                    tracing::warn!("[Orchestrator] Failed to finalize aborted message: {}", e);
                }
            }
        }

        self.publish_state(ctx.epoch, GenerationState::Aborted);
        true
    }

    /// Replays the last prompt after a recoverable failure.
    pub async fn retry(&self) -> TurnResult {
        let error = self
            .last_error
            .lock()
            .await
            .clone()
            .ok_or(OrchestratorError::NothingToRetry)?;
        if !error.is_recoverable() {
            tracing::info!("[Orchestrator] Retry rejected for {}", error.code);
            return Err(OrchestratorError::RetryRejected(error.code));
        }

        let prompt = self
            .last_prompt
            .lock()
            .await
            .clone()
            .ok_or(OrchestratorError::NothingToRetry)?;
        *self.last_error.lock().await = None;
        tracing::info!("[Orchestrator] Retrying after {}", error.code);
        self.start(prompt).await
    }

    /// Aborts the in-flight turn whenever a signal arrives on `signals`.
    pub fn spawn_cancel_listener(
        self: Arc<Self>,
        mut signals: mpsc::UnboundedReceiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while signals.recv().await.is_some() {
                if self.abort().await {
                    tracing::debug!("[Orchestrator] Aborted by cancel signal");
                }
            }
            tracing::debug!("[Orchestrator] Cancel listener stopped");
        })
    }

    // ============================================================================
    // Observation
    // ============================================================================

    pub fn state(&self) -> GenerationState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn streaming_snapshot(&self) -> Option<StreamingSnapshot> {
        self.streaming.borrow().clone()
    }

    pub fn subscribe_streaming(&self) -> watch::Receiver<Option<StreamingSnapshot>> {
        self.streaming.subscribe()
    }

    pub async fn last_error(&self) -> Option<GenerationError> {
        self.last_error.lock().await.clone()
    }

    pub async fn is_generating(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|ctx| !ctx.is_aborted())
    }

    pub fn store(&self) -> &SharedConversationStore {
        &self.store
    }

    // ============================================================================
    // Turn phases
    // ============================================================================

    /// The active session, or a new one titled from `prompt` when none is
    /// active or the active id names a missing session.
    async fn ensure_session(&self, prompt: &str) -> String {
        let mut store = self.store.write().await;
        if let Some(session) = store.active_session() {
            return session.id.clone();
        }
        if let Some(stale) = store.active_session_id() {
            tracing::warn!(
                "[Orchestrator] Active session {} no longer exists, starting a new one",
                stale
            );
        }
        store.create_session(prompt)
    }

    async fn append_turn_messages(
        &self,
        session_id: &str,
        prompt: &str,
        message_id: &str,
    ) -> lantern_core::error::Result<()> {
        let mut store = self.store.write().await;
        store.add_message(session_id, NewMessage::user(prompt))?;
        store.add_message(session_id, NewMessage::placeholder(message_id))?;
        Ok(())
    }

    async fn resolve_model(&self) -> Result<String, GenerationError> {
        let downloaded = self
            .models
            .downloaded_models()
            .await
            .map_err(|e| GenerationError::model_not_found(format!("{:#}", e)))?;

        match self.models.selected_model_id().await {
            Ok(Some(model_id)) if downloaded.contains(&model_id) => return Ok(model_id),
            Ok(Some(model_id)) => {
                tracing::debug!(
                    "[Orchestrator] Selected model {} is not downloaded, falling back",
                    model_id
                );
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("[Orchestrator] Failed to read model selection: {:#}", e),
        }

        let catalog = self
            .models
            .available_models()
            .await
            .map_err(|e| GenerationError::model_not_found(format!("{:#}", e)))?;
        let hardware = self.models.capabilities().await.unwrap_or_else(|e| {
            tracing::warn!("[Orchestrator] Hardware detection failed: {:#}", e);
            None
        });

        let model_id = ModelAutoSelector::select(&downloaded, &catalog, hardware.as_ref())
            .map_err(|failure| GenerationError::model_not_found(failure.code()))?;
        if let Err(e) = self.models.set_selected_model_id(&model_id).await {
            tracing::warn!("[Orchestrator] Failed to persist model selection: {:#}", e);
        }
        tracing::info!("[Orchestrator] Auto-selected model {}", model_id);
        Ok(model_id)
    }

    async fn run_turn(&self, ctx: &Arc<GenerationContext>, prompt: String) -> TurnResult {
        if !self.adapter.is_model_loaded().await {
            self.publish_state(ctx.epoch, GenerationState::LoadingModel);
            tracing::info!(model_id = %ctx.model_id, "[Orchestrator] Loading model");
            if let Err(e) = self.adapter.load_model(&ctx.model_id).await {
                return self.finish_failed(ctx, FailurePhase::LoadModel, e).await;
            }
        }
        if ctx.is_aborted() {
            return self.finish_aborted(ctx).await;
        }

        self.publish_state(ctx.epoch, GenerationState::Generating);
        let params = GenerationParams {
            prompt,
            model_id: ctx.model_id.clone(),
            max_tokens: self.settings.max_tokens,
        };
        let mut stream = match self.adapter.generate(params).await {
            Ok(stream) => stream,
            Err(e) => return self.finish_failed(ctx, FailurePhase::Stream, e).await,
        };

        let mut accumulated = String::new();
        let drain = loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancelled() => break Drain::Cancelled,
                next = stream.next() => next,
            };

            let chunk = match next {
                None => break Drain::Exhausted,
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => break Drain::Failed(e),
            };

            {
                let mut store = self.store.write().await;
                if ctx.is_aborted() {
                    break Drain::Cancelled;
                }
                accumulated.push_str(&chunk.text);
                store.update_message_content(
                    &ctx.session_id,
                    &ctx.message_id,
                    accumulated.clone(),
                )?;
                ctx.record_token();
            }

            self.streaming.send_replace(Some(StreamingSnapshot {
                session_id: ctx.session_id.clone(),
                message_id: ctx.message_id.clone(),
                content: accumulated.clone(),
                token_count: ctx.token_count(),
            }));
        };

        match drain {
            Drain::Exhausted => self.finish_completed(ctx).await,
            Drain::Cancelled => self.finish_aborted(ctx).await,
            Drain::Failed(e) => self.finish_failed(ctx, FailurePhase::Stream, e).await,
        }
    }

    async fn finish_completed(&self, ctx: &GenerationContext) -> TurnResult {
        let duration_ms = ctx.elapsed_ms();
        let token_count = ctx.token_count();
        {
            let mut store = self.store.write().await;
            if ctx.is_aborted() {
                drop(store);
                return self.finish_aborted(ctx).await;
            }
            let inference = InferenceInfo {
                source: self.settings.inference_source.clone(),
                model_name: ctx.model_id.clone(),
                start_time: ctx.started_at,
                token_count,
                duration_ms,
            };
            store.set_message_inference_metadata(&ctx.session_id, &ctx.message_id, inference)?;
            store.finalize_message(
                &ctx.session_id,
                &ctx.message_id,
                MessageMetadata::new(FinishReason::Completed)
                    .with_tokens(token_count)
                    .with_duration_ms(duration_ms)
                    .with_model_id(ctx.model_id.clone()),
            )?;
        }

        tracing::info!(
            message_id = %ctx.message_id,
            tokens = token_count,
            duration_ms,
            "[Orchestrator] Generation completed"
        );
        self.publish_state(ctx.epoch, GenerationState::Completed);
        Ok(TurnOutcome::Completed {
            session_id: ctx.session_id.clone(),
            message_id: ctx.message_id.clone(),
        })
    }

    async fn finish_aborted(&self, ctx: &GenerationContext) -> TurnResult {
        let token_count = ctx.token_count();
        {
            let mut store = self.store.write().await;
            let pending = store
                .message(&ctx.session_id, &ctx.message_id)
                .is_some_and(|m| !m.is_finalized());
            if pending {
                store.finalize_message(
                    &ctx.session_id,
                    &ctx.message_id,
                    MessageMetadata::new(FinishReason::Aborted)
                        .with_tokens(token_count)
                        .with_duration_ms(ctx.elapsed_ms())
                        .with_model_id(ctx.model_id.clone()),
                )?;
            }
        }

        tracing::info!(
            message_id = %ctx.message_id,
            tokens = token_count,
            "[Orchestrator] Generation aborted"
        );
        self.publish_state(ctx.epoch, GenerationState::Aborted);
        Ok(TurnOutcome::Aborted {
            session_id: ctx.session_id.clone(),
            message_id: ctx.message_id.clone(),
        })
    }

    /// Records a classified failure. Failures after an abort are swallowed.
    async fn finish_failed(
        &self,
        ctx: &GenerationContext,
        phase: FailurePhase,
        cause: AdapterError,
    ) -> TurnResult {
        let error = GenerationError::classify(phase, &cause);
        {
            let mut store = self.store.write().await;
            if ctx.is_aborted() {
                drop(store);
                tracing::debug!("[Orchestrator] Ignoring error after abort: {}", cause);
                return self.finish_aborted(ctx).await;
            }
            store.update_message_content(
                &ctx.session_id,
                &ctx.message_id,
                error.user_message.clone(),
            )?;
            store.finalize_message(
                &ctx.session_id,
                &ctx.message_id,
                MessageMetadata::new(FinishReason::Error)
                    .with_duration_ms(ctx.elapsed_ms())
                    .with_model_id(ctx.model_id.clone()),
            )?;
        }

        tracing::warn!(
            message_id = %ctx.message_id,
            code = %error.code,
            "[Orchestrator] Generation failed: {}",
            cause
        );
        *self.last_error.lock().await = Some(error.clone());
        self.publish_state(ctx.epoch, GenerationState::Error);
        Ok(TurnOutcome::Failed {
            session_id: ctx.session_id.clone(),
            message_id: Some(ctx.message_id.clone()),
            error,
        })
    }

    async fn fail_before_messages(
        &self,
        epoch: u64,
        session_id: String,
        error: GenerationError,
    ) -> TurnOutcome {
        tracing::warn!(
            code = %error.code,
            "[Orchestrator] No usable model: {}",
            error.technical_details.as_deref().unwrap_or("unknown")
        );
        *self.last_error.lock().await = Some(error.clone());
        self.publish_state(epoch, GenerationState::Error);
        TurnOutcome::Failed {
            session_id,
            message_id: None,
            error,
        }
    }

    /// Stops a turn whose message can no longer be written and leaves the
    /// state machine at `Aborted`.
    async fn abandon(&self, ctx: &GenerationContext, err: OrchestratorError) -> TurnResult {
        ctx.cancel();
        if let Err(e) = self.adapter.abort().await {
            tracing::warn!("[Orchestrator] Adapter abort failed: {}", e);
        }
        tracing::warn!(
            message_id = %ctx.message_id,
            "[Orchestrator] Turn abandoned: {}",
            err
        );
        self.publish_state(ctx.epoch, GenerationState::Aborted);
        Err(err)
    }

    async fn cleanup(&self, ctx: &GenerationContext) {
        self.streaming.send_if_modified(|snapshot| {
            let owned = snapshot
                .as_ref()
                .is_some_and(|s| s.message_id == ctx.message_id);
            if owned {
                *snapshot = None;
            }
            owned
        });

        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|c| c.epoch == ctx.epoch) {
            *current = None;
        }
    }

    fn publish_state(&self, epoch: u64, state: GenerationState) {
        if self.epoch.load(Ordering::SeqCst) == epoch {
            self.state.send_replace(state);
        }
    }
}
