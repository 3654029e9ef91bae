//! Storage backend trait.
//!
//! Defines the interface the persistence adapter writes through.

use crate::error::Result;
use async_trait::async_trait;

/// Durable key/value storage for string blobs.
///
/// # Implementation Notes
///
/// Implementations should make `set` atomic: a crash mid-write must leave
/// either the previous value or the new one, never a partial blob.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Value found
    /// - `Ok(None)`: Nothing stored under `key`
    /// - `Err(_)`: Error occurred during retrieval
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
