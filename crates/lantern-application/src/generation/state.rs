//! Turn states and outcomes.

use lantern_core::error::LanternError;
use lantern_core::inference::{GenerationError, InferenceErrorCode};
use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Where the orchestrator is in the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GenerationState {
    Idle,
    ResolvingModel,
    LoadingModel,
    Generating,
    Completed,
    Aborted,
    Error,
}

impl GenerationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Error)
    }

    /// Whether a turn is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::ResolvingModel | Self::LoadingModel | Self::Generating
        )
    }
}

/// What the UI renders while a reply streams in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingSnapshot {
    pub session_id: String,
    pub message_id: String,
    pub content: String,
    pub token_count: usize,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed {
        session_id: String,
        message_id: String,
    },
    Aborted {
        session_id: String,
        message_id: String,
    },
    /// `message_id` is `None` when the turn failed before any message was
    /// appended (no usable model).
    Failed {
        session_id: String,
        message_id: Option<String>,
        error: GenerationError,
    },
}

impl TurnOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Completed { session_id, .. }
            | Self::Aborted { session_id, .. }
            | Self::Failed { session_id, .. } => session_id,
        }
    }

    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Completed { message_id, .. } | Self::Aborted { message_id, .. } => {
                Some(message_id)
            }
            Self::Failed { message_id, .. } => message_id.as_deref(),
        }
    }

    pub fn error(&self) -> Option<&GenerationError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum OrchestratorError {
    #[error("There is no failed prompt to retry")]
    NothingToRetry,

    #[error("Retry rejected: {0} is not recoverable")]
    RetryRejected(InferenceErrorCode),

    #[error(transparent)]
    Store(#[from] LanternError),
}
