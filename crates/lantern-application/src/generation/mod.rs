//! Turn orchestration.
//!
//! # Module Structure
//!
//! - `state`: `GenerationState`, `TurnOutcome`, `StreamingSnapshot`
//! - `context`: `GenerationContext`, the record of the in-flight turn
//! - `orchestrator`: `GenerationOrchestrator`

mod context;
mod orchestrator;
mod state;

pub use context::GenerationContext;
pub use orchestrator::{GenerationOrchestrator, OrchestratorSettings};
pub use state::{GenerationState, OrchestratorError, StreamingSnapshot, TurnOutcome};
