//! Session domain module.
//!
//! This module contains the conversation data model and the store that owns it.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `PersistedState`)
//! - `message`: Conversation message types (`Message`, `MessageMetadata`, ...)
//! - `store`: The mutable conversation record (`ConversationStore`)
//! - `timestamp`: Serde representation for persisted timestamps
//!
//! # Usage
//!
//! ```ignore
//! use lantern_core::session::{ConversationStore, NewMessage, Session};
//! ```

mod message;
mod model;
mod store;
pub mod timestamp;

// Re-export public API
pub use message::{FinishReason, InferenceInfo, Message, MessageMetadata, MessageRole, NewMessage};
pub use model::{PersistedState, Session, TITLE_ELLIPSIS, TITLE_MAX_CHARS};
pub use store::{ConversationStore, SharedConversationStore};
