//! Model catalog entries.

use serde::{Deserialize, Serialize};

/// Static description of a model the app knows how to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub id: String,
    /// Display name
    pub name: String,
    /// On-disk size, also used as the VRAM requirement for GPU offload.
    pub size_mb: u64,
    pub min_ram_mb: u64,
    pub recommended_ram_mb: u64,
}

impl ModelMetadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        size_mb: u64,
        min_ram_mb: u64,
        recommended_ram_mb: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size_mb,
            min_ram_mb,
            recommended_ram_mb,
        }
    }
}
