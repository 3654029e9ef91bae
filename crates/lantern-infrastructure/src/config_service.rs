//! Configuration service implementation.
//!
//! Loads `LanternConfig` from `config.toml` (by default in
//! `~/.config/lantern/`) and caches it.

use crate::paths::LanternPaths;
use lantern_core::config::LanternConfig;
use lantern_core::error::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<LanternConfig>>>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses the platform config file location.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::new(LanternPaths::config_file()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file yields defaults; an unreadable one is logged and also
    /// yields defaults.
    pub fn get_config(&self) -> LanternConfig {
        {
            let cached = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(config) = cached.as_ref() {
                return config.clone();
            }
        }

        let loaded = self.load().unwrap_or_else(|e| {
            tracing::warn!(
                "[ConfigService] Failed to load {}: {}. Using defaults.",
                self.path.display(),
                e
            );
            LanternConfig::default()
        });

        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = None;
    }

    /// Reads and parses the config file without touching the cache.
    pub fn load(&self) -> Result<LanternConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                self.path.display()
            );
            return Ok(LanternConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));
        assert_eq!(service.get_config(), LanternConfig::default());
    }

    #[test]
    fn test_loads_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[generation]\nundo_window_secs = 10\n").unwrap();

        let service = ConfigService::new(path.clone());
        assert_eq!(service.get_config().generation.undo_window_secs, 10);

        fs::write(&path, "[generation]\nundo_window_secs = 20\n").unwrap();
        assert_eq!(service.get_config().generation.undo_window_secs, 10);

        service.invalidate_cache();
        assert_eq!(service.get_config().generation.undo_window_secs, 20);
    }

    #[test]
    fn test_invalid_file_is_an_error_but_get_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[persistence\n").unwrap();

        let service = ConfigService::new(path);
        assert!(service.load().unwrap_err().is_serialization());
        assert_eq!(service.get_config(), LanternConfig::default());
    }
}
