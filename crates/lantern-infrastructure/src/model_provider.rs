//! A `ModelProvider` backed by a fixed catalog and an in-memory selection.
//!
//! Used when the host application already knows what is on disk and only
//! needs the orchestrator to read and update the selection.

use anyhow::Result;
use async_trait::async_trait;
use lantern_core::model::{HardwareCapabilities, ModelMetadata, ModelProvider};
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct StaticModelProvider {
    catalog: Vec<ModelMetadata>,
    downloaded: RwLock<HashSet<String>>,
    selected: RwLock<Option<String>>,
    hardware: Option<HardwareCapabilities>,
}

impl StaticModelProvider {
    pub fn new(catalog: Vec<ModelMetadata>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn with_downloaded<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            downloaded: RwLock::new(ids.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    pub fn with_selected(self, model_id: impl Into<String>) -> Self {
        Self {
            selected: RwLock::new(Some(model_id.into())),
            ..self
        }
    }

    pub fn with_hardware(self, hardware: HardwareCapabilities) -> Self {
        Self {
            hardware: Some(hardware),
            ..self
        }
    }

    /// Records a finished download.
    pub async fn mark_downloaded(&self, model_id: impl Into<String>) {
        self.downloaded.write().await.insert(model_id.into());
    }

    /// Records a deleted model.
    pub async fn mark_removed(&self, model_id: &str) {
        self.downloaded.write().await.remove(model_id);
    }
}

#[async_trait]
impl ModelProvider for StaticModelProvider {
    async fn downloaded_models(&self) -> Result<HashSet<String>> {
        Ok(self.downloaded.read().await.clone())
    }

    async fn available_models(&self) -> Result<Vec<ModelMetadata>> {
        Ok(self.catalog.clone())
    }

    async fn selected_model_id(&self) -> Result<Option<String>> {
        Ok(self.selected.read().await.clone())
    }

    async fn set_selected_model_id(&self, model_id: &str) -> Result<()> {
        *self.selected.write().await = Some(model_id.to_string());
        Ok(())
    }

    async fn capabilities(&self) -> Result<Option<HardwareCapabilities>> {
        Ok(self.hardware.clone())
    }
}
