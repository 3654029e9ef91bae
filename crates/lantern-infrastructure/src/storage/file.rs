//! File-backed storage: one JSON file per key under a root directory.

use super::atomic_file::AtomicFile;
use async_trait::async_trait;
use lantern_core::error::{LanternError, Result};
use lantern_core::persistence::StorageBackend;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, key: &str) -> Result<AtomicFile> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(LanternError::storage(format!("Invalid storage key: {:?}", key)));
        }
        Ok(AtomicFile::new(self.root.join(format!("{}.json", key))))
    }

    /// Runs blocking file work off the async runtime.
    async fn blocking<T, F>(&self, key: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(AtomicFile) -> Result<T> + Send + 'static,
    {
        let file = self.file_for(key)?;
        tokio::task::spawn_blocking(move || op(file))
            .await
            .map_err(|e| LanternError::internal(format!("Storage task failed: {}", e)))?
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.blocking(key, |file| file.read()).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let value = value.to_string();
        self.blocking(key, move |file| file.write(&value)).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.blocking(key, |file| file.remove()).await
    }
}
