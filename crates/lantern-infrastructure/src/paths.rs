//! Unified path management for Lantern files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/lantern/            # Config directory
//! └── config.toml               # Application configuration
//!
//! ~/.local/share/lantern/       # Data directory
//! └── store/                    # Persisted conversation state
//!     └── lantern-chat-store.json
//! ```

use lantern_core::error::{LanternError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "lantern";

pub struct LanternPaths;

impl LanternPaths {
    /// Returns the Lantern configuration directory (e.g. `~/.config/lantern/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| LanternError::config("Cannot find config directory"))
    }

    /// Returns the Lantern data directory (e.g. `~/.local/share/lantern/`).
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| LanternError::config("Cannot find data directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory for the state store, honoring a configured override.
    pub fn store_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        let base = match data_dir_override {
            Some(dir) => dir.clone(),
            None => Self::data_dir()?,
        };
        Ok(base.join("store"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_dir_uses_override() {
        let base = PathBuf::from("/tmp/lantern-test");
        assert_eq!(
            LanternPaths::store_dir(Some(&base)).unwrap(),
            base.join("store")
        );
    }
}
