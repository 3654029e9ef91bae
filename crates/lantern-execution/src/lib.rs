//! Process-level wiring: subscriber setup and generation event forwarding.

pub mod logging;
pub mod tracing_layer;

pub use logging::init_tracing;
pub use tracing_layer::{GENERATION_TARGET, GenerationEvent, GenerationEventLayer};
