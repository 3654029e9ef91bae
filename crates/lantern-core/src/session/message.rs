//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles, content and the terminal metadata attached to assistant
//! replies.

use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the language model.
    Assistant,
}

/// Terminal classification of a generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FinishReason {
    Completed,
    Aborted,
    Error,
}

/// Details about the inference run that produced a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceInfo {
    /// Where the reply came from (e.g. "local").
    pub source: String,
    pub model_name: String,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    pub token_count: usize,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

/// Metadata attached once an assistant message reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_generated: Option<usize>,
    pub finish_reason: FinishReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference: Option<InferenceInfo>,
}

impl MessageMetadata {
    /// Metadata carrying only a finish reason.
    pub fn new(finish_reason: FinishReason) -> Self {
        Self {
            tokens_generated: None,
            finish_reason,
            duration_ms: None,
            model_id: None,
            inference: None,
        }
    }

    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.tokens_generated = Some(tokens);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// A single message in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier (UUID format)
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// When the message was created.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Terminal metadata; `None` while the message is still streaming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// Returns the finish reason if the message has been finalized.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.metadata.as_ref().map(|m| m.finish_reason)
    }

    pub fn is_finalized(&self) -> bool {
        self.metadata.is_some()
    }
}

/// Input for [`ConversationStore::add_message`](super::ConversationStore::add_message).
///
/// `id` lets the caller fix the message id up front, which the placeholder
/// pattern relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub role: MessageRole,
    pub content: String,
    pub id: Option<String>,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            id: None,
        }
    }

    /// An empty assistant message with a caller-chosen id.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: String::new(),
            id: Some(id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_and_finish_reason_wire_names() {
        assert_eq!(serde_json::to_string(&MessageRole::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&FinishReason::Aborted).unwrap(), "\"aborted\"");
        assert_eq!(FinishReason::Completed.to_string(), "completed");
    }

    #[test]
    fn test_metadata_omits_absent_fields() {
        let metadata = MessageMetadata::new(FinishReason::Error);
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json, serde_json::json!({ "finishReason": "error" }));
    }

    #[test]
    fn test_placeholder_keeps_id() {
        let placeholder = NewMessage::placeholder("msg-1");
        assert_eq!(placeholder.role, MessageRole::Assistant);
        assert!(placeholder.content.is_empty());
        assert_eq!(placeholder.id.as_deref(), Some("msg-1"));
    }
}
