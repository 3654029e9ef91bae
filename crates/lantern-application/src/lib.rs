pub mod autosave;
pub mod bootstrap;
pub mod generation;
pub mod session;

pub use autosave::AutosaveService;
pub use bootstrap::{LanternApp, bootstrap, file_backend};
pub use generation::{
    GenerationOrchestrator, GenerationState, OrchestratorError, OrchestratorSettings,
    StreamingSnapshot, TurnOutcome,
};
pub use session::{ConversationService, SessionSummary};
