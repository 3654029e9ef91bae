//! Generation error taxonomy.
//!
//! [`AdapterError`] is what an inference engine reports. The orchestrator
//! classifies it into an [`InferenceErrorCode`] and surfaces a
//! [`GenerationError`] carrying a user-facing message.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Failure reported by an [`InferenceAdapter`](super::InferenceAdapter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("no model is loaded")]
    ModelNotLoaded,

    #[error("failed to load model: {0}")]
    LoadFailed(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("inference timed out: {0}")]
    Timeout(String),

    #[error("inference backend error: {0}")]
    Backend(String),
}

impl AdapterError {
    /// Whether the failure is memory exhaustion, either typed or as reported
    /// in the engine's message.
    pub fn is_out_of_memory(&self) -> bool {
        match self {
            Self::OutOfMemory(_) => true,
            Self::LoadFailed(message) | Self::Backend(message) => {
                message.to_lowercase().contains("memory") || message.contains("OOM")
            }
            _ => false,
        }
    }
}

/// Where in a turn a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePhase {
    LoadModel,
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InferenceErrorCode {
    ModelNotFound,
    ModelLoadFailed,
    OomError,
    InferenceTimeout,
    UnknownError,
}

/// User-facing text for an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInfo {
    pub user_message: &'static str,
    pub recovery_hint: &'static str,
}

impl InferenceErrorCode {
    pub fn info(self) -> ErrorInfo {
        match self {
            Self::ModelNotFound => ErrorInfo {
                user_message: "No model is available. Download or select a model to start chatting.",
                recovery_hint: "Open the model library and download a model.",
            },
            Self::ModelLoadFailed => ErrorInfo {
                user_message: "Couldn't load the model. Please restart and try again.",
                recovery_hint: "Restart the app. If the problem persists, re-download the model.",
            },
            Self::OomError => ErrorInfo {
                user_message: "Not enough memory for this model. Try a smaller model.",
                recovery_hint: "Choose a smaller model or close other applications.",
            },
            Self::InferenceTimeout => ErrorInfo {
                user_message: "The model took too long to respond.",
                recovery_hint: "Try again with a shorter prompt.",
            },
            Self::UnknownError => ErrorInfo {
                user_message: "Something went wrong. Please try again.",
                recovery_hint: "Retry your last message.",
            },
        }
    }

    /// Whether retrying the same prompt can succeed without a restart.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, Self::ModelLoadFailed)
    }
}

/// A classified generation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {user_message}")]
pub struct GenerationError {
    pub code: InferenceErrorCode,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<String>,
}

impl GenerationError {
    pub fn new(code: InferenceErrorCode, technical_details: Option<String>) -> Self {
        Self {
            code,
            user_message: code.info().user_message.to_string(),
            technical_details,
        }
    }

    pub fn model_not_found(details: impl Into<String>) -> Self {
        Self::new(InferenceErrorCode::ModelNotFound, Some(details.into()))
    }

    /// Maps an adapter failure to the taxonomy.
    pub fn classify(phase: FailurePhase, err: &AdapterError) -> Self {
        let code = if err.is_out_of_memory() {
            InferenceErrorCode::OomError
        } else {
            match (phase, err) {
                (FailurePhase::LoadModel, _) => InferenceErrorCode::ModelLoadFailed,
                (FailurePhase::Stream, AdapterError::Timeout(_)) => {
                    InferenceErrorCode::InferenceTimeout
                }
                (
                    FailurePhase::Stream,
                    AdapterError::ModelNotLoaded | AdapterError::ModelNotFound(_),
                ) => InferenceErrorCode::ModelNotFound,
                (FailurePhase::Stream, _) => InferenceErrorCode::UnknownError,
            }
        };
        Self::new(code, Some(err.to_string()))
    }

    pub fn is_recoverable(&self) -> bool {
        self.code.is_recoverable()
    }

    pub fn recovery_hint(&self) -> &'static str {
        self.code.info().recovery_hint
    }
}
