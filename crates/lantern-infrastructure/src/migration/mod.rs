//! Schema migration for persisted blobs.
//!
//! # Module Structure
//!
//! - `traits`: `Migration`, `TypedMigration`, `MigrationChain`
//! - `registry`: linear `MigrationRegistry`
//! - `state`: migrations for the conversation state blob

mod registry;
mod state;
mod traits;

pub use registry::MigrationRegistry;
pub use state::{CURRENT_STATE_VERSION, StripUiStateV0ToV1, state_migrations};
pub use traits::{Migration, MigrationChain, TypedMigration};
