//! Host hardware description and fit classification.

use super::catalog::ModelMetadata;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub ram_mb: u64,
    pub cpu_cores: u32,
    pub storage_available_mb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuInfo {
    pub name: String,
    pub vram_mb: u64,
    /// Whether the GPU can be used for inference at all.
    pub compute_capable: bool,
}

/// Hardware capabilities reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareCapabilities {
    pub system: SystemInfo,
    #[serde(default)]
    pub gpu: Option<GpuInfo>,
}

impl HardwareCapabilities {
    /// Usable VRAM, or zero without a compute-capable GPU.
    pub fn usable_vram_mb(&self) -> u64 {
        self.gpu
            .as_ref()
            .filter(|gpu| gpu.compute_capable)
            .map_or(0, |gpu| gpu.vram_mb)
    }
}

/// How well a model fits the host. Variants are ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HardwareFit {
    NotRecommended,
    MayBeSlow,
    Recommended,
}

impl HardwareFit {
    /// Classifies `model` against `hardware`; unknown hardware is `MayBeSlow`.
    pub fn classify(model: &ModelMetadata, hardware: Option<&HardwareCapabilities>) -> Self {
        let Some(hardware) = hardware else {
            return Self::MayBeSlow;
        };

        let ram = hardware.system.ram_mb;
        if ram >= model.recommended_ram_mb || hardware.usable_vram_mb() >= model.size_mb.max(1) {
            Self::Recommended
        } else if ram >= model.min_ram_mb {
            Self::MayBeSlow
        } else {
            Self::NotRecommended
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ModelMetadata {
        ModelMetadata::new("m", "M", 4_000, 8_000, 16_000)
    }

    fn hardware(ram_mb: u64, gpu: Option<GpuInfo>) -> HardwareCapabilities {
        HardwareCapabilities {
            system: SystemInfo {
                ram_mb,
                cpu_cores: 8,
                storage_available_mb: 100_000,
            },
            gpu,
        }
    }

    #[test]
    fn test_fit_ordering() {
        assert!(HardwareFit::Recommended > HardwareFit::MayBeSlow);
        assert!(HardwareFit::MayBeSlow > HardwareFit::NotRecommended);
        assert_eq!(HardwareFit::MayBeSlow.to_string(), "may-be-slow");
    }

    #[test]
    fn test_classify_by_ram() {
        let model = model();
        assert_eq!(
            HardwareFit::classify(&model, Some(&hardware(16_000, None))),
            HardwareFit::Recommended
        );
        assert_eq!(
            HardwareFit::classify(&model, Some(&hardware(8_000, None))),
            HardwareFit::MayBeSlow
        );
        assert_eq!(
            HardwareFit::classify(&model, Some(&hardware(4_000, None))),
            HardwareFit::NotRecommended
        );
    }

    #[test]
    fn test_gpu_offload_counts_only_when_compute_capable() {
        let model = model();
        let capable = GpuInfo {
            name: "gpu".to_string(),
            vram_mb: 6_000,
            compute_capable: true,
        };
        let incapable = GpuInfo {
            compute_capable: false,
            ..capable.clone()
        };
        assert_eq!(
            HardwareFit::classify(&model, Some(&hardware(4_000, Some(capable)))),
            HardwareFit::Recommended
        );
        assert_eq!(
            HardwareFit::classify(&model, Some(&hardware(4_000, Some(incapable)))),
            HardwareFit::NotRecommended
        );
    }

    #[test]
    fn test_unknown_hardware_may_be_slow() {
        assert_eq!(HardwareFit::classify(&model(), None), HardwareFit::MayBeSlow);
    }
}
