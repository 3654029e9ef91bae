//! Fallback model selection.
//!
//! When the user has not picked a model (or the pick is no longer
//! downloaded), the orchestrator asks [`ModelAutoSelector`] for the best
//! downloaded model for this machine. Selection is a pure function of its
//! inputs.

use super::catalog::ModelMetadata;
use super::hardware::{HardwareCapabilities, HardwareFit};
use std::cmp::Reverse;
use std::collections::HashSet;
use thiserror::Error;

/// Why no model could be selected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFailure {
    #[error("no models are downloaded")]
    NoDownloadedModels,
    #[error("none of the downloaded models are in the catalog")]
    NoKnownModels,
}

impl SelectionFailure {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoDownloadedModels => "no-downloaded-models",
            Self::NoKnownModels => "no-known-models",
        }
    }
}

/// A downloaded catalog entry with its fit for the current host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedModel<'a> {
    pub model: &'a ModelMetadata,
    pub fit: HardwareFit,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ModelAutoSelector;

impl ModelAutoSelector {
    /// Ranks every downloaded catalog entry, best fit first.
    ///
    /// Entries with equal fit keep catalog order.
    pub fn rank<'a>(
        downloaded: &HashSet<String>,
        catalog: &'a [ModelMetadata],
        hardware: Option<&HardwareCapabilities>,
    ) -> Vec<RankedModel<'a>> {
        let mut ranked: Vec<RankedModel<'a>> = catalog
            .iter()
            .filter(|model| downloaded.contains(&model.id))
            .map(|model| RankedModel {
                model,
                fit: HardwareFit::classify(model, hardware),
            })
            .collect();
        ranked.sort_by_key(|candidate| Reverse(candidate.fit));
        ranked
    }

    /// Picks the best downloaded model for the host.
    pub fn select(
        downloaded: &HashSet<String>,
        catalog: &[ModelMetadata],
        hardware: Option<&HardwareCapabilities>,
    ) -> Result<String, SelectionFailure> {
        if downloaded.is_empty() {
            return Err(SelectionFailure::NoDownloadedModels);
        }

        let best = Self::rank(downloaded, catalog, hardware)
            .into_iter()
            .next()
            .ok_or(SelectionFailure::NoKnownModels)?;
        tracing::debug!(
            "[ModelAutoSelector] Selected {} ({})",
            best.model.id,
            best.fit
        );
        Ok(best.model.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SystemInfo;

    fn catalog() -> Vec<ModelMetadata> {
        vec![
            ModelMetadata::new("large", "Large", 8_000, 16_000, 32_000),
            ModelMetadata::new("medium", "Medium", 4_000, 8_000, 12_000),
            ModelMetadata::new("small", "Small", 2_000, 4_000, 6_000),
            ModelMetadata::new("tiny", "Tiny", 1_000, 2_000, 3_000),
        ]
    }

    fn downloaded(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn ram(ram_mb: u64) -> HardwareCapabilities {
        HardwareCapabilities {
            system: SystemInfo {
                ram_mb,
                cpu_cores: 4,
                storage_available_mb: 50_000,
            },
            gpu: None,
        }
    }

    #[test]
    fn test_empty_downloaded_fails() {
        let result = ModelAutoSelector::select(&HashSet::new(), &catalog(), Some(&ram(64_000)));
        assert_eq!(result, Err(SelectionFailure::NoDownloadedModels));
        assert_eq!(SelectionFailure::NoDownloadedModels.code(), "no-downloaded-models");
    }

    #[test]
    fn test_unknown_downloaded_ids_fail() {
        let result = ModelAutoSelector::select(&downloaded(&["mystery"]), &catalog(), None);
        assert_eq!(result, Err(SelectionFailure::NoKnownModels));
    }

    #[test]
    fn test_result_is_always_downloaded_and_catalogued() {
        let catalog = catalog();
        let downloaded = downloaded(&["medium", "tiny", "mystery"]);
        for ram_mb in [1_000, 2_500, 8_000, 12_000, 64_000] {
            let id = ModelAutoSelector::select(&downloaded, &catalog, Some(&ram(ram_mb))).unwrap();
            assert!(downloaded.contains(&id));
            assert!(catalog.iter().any(|m| m.id == id));
        }
    }

    #[test]
    fn test_picks_best_fit_tier() {
        // 8 GB: medium may be slow, tiny is recommended.
        let id = ModelAutoSelector::select(
            &downloaded(&["medium", "tiny"]),
            &catalog(),
            Some(&ram(8_000)),
        )
        .unwrap();
        assert_eq!(id, "tiny");
    }

    #[test]
    fn test_tie_breaks_on_catalog_order() {
        let id = ModelAutoSelector::select(
            &downloaded(&["tiny", "small", "medium"]),
            &catalog(),
            Some(&ram(64_000)),
        )
        .unwrap();
        assert_eq!(id, "medium");

        // Unknown hardware puts every candidate in the same tier.
        let id = ModelAutoSelector::select(&downloaded(&["tiny", "small"]), &catalog(), None).unwrap();
        assert_eq!(id, "small");
    }

    #[test]
    fn test_no_candidate_better_than_selection() {
        let catalog = catalog();
        let downloaded = downloaded(&["large", "medium", "small", "tiny"]);
        let hardware = ram(7_000);
        let ranked = ModelAutoSelector::rank(&downloaded, &catalog, Some(&hardware));
        let selected = ModelAutoSelector::select(&downloaded, &catalog, Some(&hardware)).unwrap();
        let selected_fit = ranked.iter().find(|r| r.model.id == selected).unwrap().fit;
        assert!(ranked.iter().all(|r| r.fit <= selected_fit));
        assert_eq!(ranked.len(), 4);
        assert_eq!(selected, "small");
    }
}
