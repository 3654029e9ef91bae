use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storage key the conversation blob lives under.
pub const DEFAULT_STORAGE_KEY: &str = "lantern-chat-store";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct LanternConfig {
    pub persistence: PersistenceConfig,
    pub generation: GenerationConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PersistenceConfig {
    pub storage_key: String,
    /// Storage operations slower than this are logged.
    pub latency_budget_ms: u64,
    pub autosave_debounce_ms: u64,
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            latency_budget_ms: 50,
            autosave_debounce_ms: 250,
            data_dir: None,
        }
    }
}

impl PersistenceConfig {
    pub fn latency_budget(&self) -> Duration {
        Duration::from_millis(self.latency_budget_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: Option<usize>,
    /// How long a deleted session can be restored.
    pub undo_window_secs: u64,
    /// Recorded as `inference.source` on completed replies.
    pub inference_source: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: None,
            undo_window_secs: 30,
            inference_source: "local".to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: LanternConfig = toml::from_str(
            r#"
            [persistence]
            latency_budget_ms = 80

            [generation]
            max_tokens = 512
            "#,
        )
        .unwrap();
        assert_eq!(config.persistence.latency_budget_ms, 80);
        assert_eq!(config.persistence.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.generation.max_tokens, Some(512));
        assert_eq!(config.generation.undo_window(), Duration::from_secs(30));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: LanternConfig = toml::from_str("").unwrap();
        assert_eq!(config, LanternConfig::default());
    }
}
