pub mod config;
pub mod error;
pub mod inference;
pub mod model;
pub mod persistence;
pub mod session;

// Re-export common error type
pub use error::LanternError;
