//! Versioned encoding of the conversation state.
//!
//! The stored blob is an envelope `{"state": {...}, "version": N}`. Decoding
//! reads the version, runs the migration chain on the raw state and only then
//! deserializes into typed structs, so dates always come back as
//! `DateTime<Utc>`.

use crate::migration::{CURRENT_STATE_VERSION, MigrationChain, MigrationRegistry, state_migrations};
use lantern_core::error::{LanternError, Result};
use lantern_core::session::PersistedState;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a PersistedState,
    version: u32,
}

#[derive(Debug)]
pub struct StateCodec {
    migrations: MigrationRegistry<Value>,
}

impl Default for StateCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCodec {
    pub fn new() -> Self {
        Self::with_migrations(state_migrations())
    }

    pub fn with_migrations(migrations: MigrationRegistry<Value>) -> Self {
        Self { migrations }
    }

    pub fn version(&self) -> u32 {
        self.migrations.latest_version()
    }

    pub fn encode(&self, state: &PersistedState) -> Result<String> {
        let envelope = EnvelopeRef {
            state,
            version: self.version(),
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Decodes a stored blob, migrating it to the current version first.
    ///
    /// A bare state object without an envelope is treated as version 0.
    pub fn decode(&self, raw: &str) -> Result<PersistedState> {
        let (state, version) = match serde_json::from_str::<Value>(raw)? {
            Value::Object(mut envelope) if envelope.contains_key("state") => {
                let version = envelope
                    .get("version")
                    .and_then(Value::as_u64)
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| LanternError::migration("Envelope has no valid version"))?;
                let state = envelope.remove("state").unwrap_or(Value::Null);
                (state, version)
            }
            bare => (bare, 0),
        };

        if version != CURRENT_STATE_VERSION {
            tracing::info!(
                "[StateCodec] Migrating stored state from version {} to {}",
                version,
                self.version()
            );
        }

        let migrated = self
            .migrations
            .migrate_to_latest(state, version)
            .map_err(|e| LanternError::migration(format!("{:#}", e)))?;
        Ok(serde_json::from_value(migrated)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lantern_core::session::{FinishReason, Message, MessageMetadata, MessageRole, Session};
    use serde_json::json;

    fn sample_state() -> PersistedState {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut session = Session::new("What is Rust?");
        session.created_at = created;
        session.updated_at = created + chrono::Duration::milliseconds(1_250);
        session.messages = vec![
            Message {
                id: "m1".to_string(),
                role: MessageRole::User,
                content: "What is Rust?".to_string(),
                timestamp: created,
                metadata: None,
            },
            Message {
                id: "m2".to_string(),
                role: MessageRole::Assistant,
                content: "A systems language.".to_string(),
                timestamp: created,
                metadata: Some(
                    MessageMetadata::new(FinishReason::Completed)
                        .with_tokens(4)
                        .with_duration_ms(120)
                        .with_model_id("phi-3"),
                ),
            },
        ];
        PersistedState {
            active_session_id: Some(session.id.clone()),
            sessions: vec![session],
        }
    }

    #[test]
    fn test_round_trip_keeps_typed_dates() {
        let codec = StateCodec::new();
        let state = sample_state();
        let decoded = codec.decode(&codec.encode(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(
            decoded.sessions[0].updated_at - decoded.sessions[0].created_at,
            chrono::Duration::milliseconds(1_250)
        );
    }

    #[test]
    fn test_envelope_shape() {
        let codec = StateCodec::new();
        let blob: Value = serde_json::from_str(&codec.encode(&PersistedState::default()).unwrap()).unwrap();
        assert_eq!(
            blob,
            json!({ "state": { "sessions": [], "activeSessionId": null }, "version": 1 })
        );
    }

    #[test]
    fn test_dates_are_strings_on_the_wire() {
        let codec = StateCodec::new();
        let blob: Value = serde_json::from_str(&codec.encode(&sample_state()).unwrap()).unwrap();
        assert_eq!(blob["state"]["sessions"][0]["createdAt"], "2026-03-01T09:00:00Z");
    }

    #[test]
    fn test_bare_legacy_state_is_migrated() {
        let raw = r#"{
            "sessions": [{
                "id": "s1",
                "title": "Hi",
                "messages": [],
                "createdAt": 1772355600000,
                "updatedAt": "2026-03-01T09:00:00Z"
            }],
            "isDirty": true
        }"#;
        let state = StateCodec::new().decode(raw).unwrap();
        assert_eq!(state.sessions.len(), 1);
        assert_eq!(state.active_session_id, None);
        assert_eq!(state.sessions[0].created_at, state.sessions[0].updated_at);
    }

    #[test]
    fn test_future_version_is_rejected() {
        let raw = r#"{"state":{"sessions":[]},"version":7}"#;
        let err = StateCodec::new().decode(raw).unwrap_err();
        assert!(err.is_migration());
    }

    #[test]
    fn test_garbage_is_a_serialization_error() {
        let err = StateCodec::new().decode("not json").unwrap_err();
        assert!(err.is_serialization());
    }
}
