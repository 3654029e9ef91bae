//! Session domain model.
//!
//! This module contains the core Session entity and the persisted shape of
//! the conversation state.

use super::message::Message;
use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters taken from the first message for a title.
pub const TITLE_MAX_CHARS: usize = 50;

/// Marker appended to truncated titles.
pub const TITLE_ELLIPSIS: &str = "...";

/// Represents a chat session in the application's domain layer.
///
/// `messages` is ordered oldest first. `updated_at` never moves backwards;
/// use [`Session::touch`] rather than assigning it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Conversation history
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session titled after `first_message`.
    pub fn new(first_message: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: Self::title_from(first_message),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Derives a session title from the first user message.
    pub fn title_from(first_message: &str) -> String {
        let trimmed = first_message.trim();
        let mut chars = trimmed.chars();
        let title: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
        if chars.next().is_some() {
            format!("{}{}", title, TITLE_ELLIPSIS)
        } else {
            title
        }
    }

    /// Stamps `updated_at` with the current time without moving it backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// The durable part of the conversation state.
///
/// UI-only state such as the dirty flag or last save time is not part of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub active_session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_short_title_is_kept_verbatim() {
        assert_eq!(Session::title_from("Hello"), "Hello");
    }

    #[test]
    fn test_long_title_is_truncated_with_marker() {
        let text = "a".repeat(60);
        let title = Session::title_from(&text);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_exactly_fifty_chars_has_no_marker() {
        let text = "b".repeat(50);
        assert_eq!(Session::title_from(&text), text);
    }

    #[test]
    fn test_title_truncates_on_char_boundaries() {
        let text = "こんにちは".repeat(12);
        let title = Session::title_from(&text);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut session = Session::new("hi");
        let future = Utc::now() + Duration::hours(1);
        session.updated_at = future;
        session.touch();
        assert_eq!(session.updated_at, future);
    }

    #[test]
    fn test_persisted_state_field_names() {
        let state = PersistedState {
            sessions: vec![],
            active_session_id: Some("s1".to_string()),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "sessions": [], "activeSessionId": "s1" })
        );
    }
}
