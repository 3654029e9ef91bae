//! Model catalog, hardware fit and automatic model selection.

mod catalog;
mod hardware;
mod provider;
mod selector;

pub use catalog::ModelMetadata;
pub use hardware::{GpuInfo, HardwareCapabilities, HardwareFit, SystemInfo};
pub use provider::ModelProvider;
pub use selector::{ModelAutoSelector, RankedModel, SelectionFailure};
