//! Inference adapter interface.
//!
//! The inference engine itself lives outside this workspace; the orchestrator
//! only sees it through [`InferenceAdapter`].

use super::error::AdapterError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use strum::Display;

/// A single streamed increment of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenChunk {
    pub text: String,
}

impl TokenChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Ordered, finite stream of generated text.
///
/// Natural exhaustion means the model finished; an `Err` item ends the run.
pub type TokenStream = BoxStream<'static, Result<TokenChunk, AdapterError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParams {
    pub prompt: String,
    pub model_id: String,
    pub max_tokens: Option<usize>,
}

/// Engine lifecycle status, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModelStatus {
    Unloaded,
    Loading,
    Loaded,
    Generating,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterCapabilities {
    pub streaming: bool,
    pub supports_abort: bool,
    #[serde(default)]
    pub context_length: Option<usize>,
}

impl Default for AdapterCapabilities {
    fn default() -> Self {
        Self {
            streaming: true,
            supports_abort: true,
            context_length: None,
        }
    }
}

/// Bridge to a local inference engine.
#[async_trait]
pub trait InferenceAdapter: Send + Sync {
    /// Starts generating and returns the token stream.
    async fn generate(&self, params: GenerationParams) -> Result<TokenStream, AdapterError>;

    /// Asks the engine to stop the running generation.
    async fn abort(&self) -> Result<(), AdapterError>;

    async fn is_model_loaded(&self) -> bool;

    async fn load_model(&self, model_id: &str) -> Result<(), AdapterError>;

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::default()
    }

    async fn status(&self) -> ModelStatus;
}
