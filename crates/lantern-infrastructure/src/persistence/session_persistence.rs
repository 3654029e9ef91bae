//! Loading and saving the conversation state blob.

use super::adapter::PersistenceAdapter;
use super::codec::StateCodec;
use lantern_core::config::DEFAULT_STORAGE_KEY;
use lantern_core::error::Result;
use lantern_core::session::PersistedState;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SessionPersistence {
    adapter: PersistenceAdapter,
    codec: Arc<StateCodec>,
    key: String,
}

impl SessionPersistence {
    pub fn new(adapter: PersistenceAdapter) -> Self {
        Self {
            adapter,
            codec: Arc::new(StateCodec::new()),
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the stored state.
    ///
    /// Read, decode or migration failures are logged and treated as "nothing
    /// stored" so that a damaged blob never blocks startup.
    pub async fn load(&self) -> Option<PersistedState> {
        let raw = match self.adapter.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("[SessionPersistence] No stored state under '{}'", self.key);
                return None;
            }
            Err(e) => {
                tracing::warn!("[SessionPersistence] Failed to read '{}': {}", self.key, e);
                return None;
            }
        };

        match self.codec.decode(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("[SessionPersistence] Discarding unreadable state: {}", e);
                None
            }
        }
    }

    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        let blob = self.codec.encode(state)?;
        self.adapter.set(&self.key, &blob).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.adapter.remove(&self.key).await
    }
}
