//! Migrations for the persisted conversation state.
//!
//! Version 0 is the pre-envelope blob: the state object was written bare and
//! still carried UI-only fields. Version 1 is the current envelope payload.

use super::registry::MigrationRegistry;
use super::traits::{Migration, TypedMigration};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// Schema version written by this build.
pub const CURRENT_STATE_VERSION: u32 = 1;

/// Fields that older builds persisted alongside the durable state.
const UI_ONLY_FIELDS: &[&str] = &["isDirty", "lastSavedAt", "recoveredFromCrash", "isGenerating"];

/// Drops UI-only fields and fills in `activeSessionId`.
#[derive(Debug)]
pub struct StripUiStateV0ToV1;

impl Migration for StripUiStateV0ToV1 {
    fn from_version(&self) -> u32 {
        0
    }

    fn description(&self) -> &str {
        "Remove UI-only fields from the persisted state"
    }
}

impl TypedMigration<Value, Value> for StripUiStateV0ToV1 {
    fn migrate(&self, from: Value) -> Result<Value> {
        let mut state = match from {
            Value::Object(state) => state,
            other => anyhow::bail!("Expected state object, found {}", kind_of(&other)),
        };
        for field in UI_ONLY_FIELDS {
            state.remove(*field);
        }
        state.entry("sessions").or_insert_with(|| Value::Array(Vec::new()));
        state.entry("activeSessionId").or_insert(Value::Null);
        Ok(Value::Object(state))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds the registry used when loading persisted state.
pub fn state_migrations() -> MigrationRegistry<Value> {
    let mut registry = MigrationRegistry::new(CURRENT_STATE_VERSION);
    registry.register(Arc::new(StripUiStateV0ToV1));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationChain;
    use serde_json::json;

    #[test]
    fn test_v0_blob_is_cleaned() {
        let legacy = json!({
            "sessions": [],
            "isDirty": true,
            "lastSavedAt": 1772368200000i64,
        });
        let migrated = state_migrations().migrate_to_latest(legacy, 0).unwrap();
        assert_eq!(migrated, json!({ "sessions": [], "activeSessionId": null }));
    }

    #[test]
    fn test_current_version_passes_through() {
        let current = json!({ "sessions": [], "activeSessionId": "s1", "extra": 1 });
        let migrated = state_migrations()
            .migrate_to_latest(current.clone(), CURRENT_STATE_VERSION)
            .unwrap();
        assert_eq!(migrated, current);
    }

    #[test]
    fn test_non_object_state_fails() {
        let result = state_migrations().migrate_to_latest(json!([1, 2]), 0);
        assert!(result.is_err());
    }
}
