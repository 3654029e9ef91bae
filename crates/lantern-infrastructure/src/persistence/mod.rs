//! Durable persistence for the conversation state.
//!
//! # Module Structure
//!
//! - `adapter`: `PersistenceAdapter`, latency-budgeted get/set/remove
//! - `codec`: `StateCodec`, the versioned envelope
//! - `session_persistence`: `SessionPersistence`, load/save of the state blob

mod adapter;
mod codec;
mod session_persistence;

pub use adapter::{DEFAULT_LATENCY_BUDGET, PersistenceAdapter};
pub use codec::StateCodec;
pub use session_persistence::SessionPersistence;
