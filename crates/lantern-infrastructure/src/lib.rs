pub mod config_service;
pub mod migration;
pub mod model_provider;
pub mod paths;
pub mod persistence;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::model_provider::StaticModelProvider;
pub use crate::paths::LanternPaths;
pub use crate::persistence::{PersistenceAdapter, SessionPersistence, StateCodec};
pub use crate::storage::{FileStorage, MemoryStorage};
