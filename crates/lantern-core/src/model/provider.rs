//! Model provider trait.

use super::catalog::ModelMetadata;
use super::hardware::HardwareCapabilities;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Source of model availability, the user's selection and host hardware.
///
/// Downloading and verifying models happen elsewhere; this trait only
/// reports what is on disk.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Ids of models that are fully downloaded.
    async fn downloaded_models(&self) -> Result<HashSet<String>>;

    /// The model catalog, in display order.
    async fn available_models(&self) -> Result<Vec<ModelMetadata>>;

    /// The user's selected model, if any.
    async fn selected_model_id(&self) -> Result<Option<String>>;

    /// Persists a new selection.
    async fn set_selected_model_id(&self, model_id: &str) -> Result<()>;

    /// Host hardware, or `None` when detection is unavailable.
    async fn capabilities(&self) -> Result<Option<HardwareCapabilities>>;
}
