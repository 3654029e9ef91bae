mod service;
mod trash;

pub use service::{ConversationService, SessionSummary};
pub use trash::{DEFAULT_UNDO_WINDOW, SessionTrash};
