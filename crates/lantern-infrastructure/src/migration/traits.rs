//! Core traits for the migration framework.
//!
//! Stored blobs carry an integer schema version. A migration upgrades data
//! by exactly one version step; chains of them bring old blobs up to date.

use anyhow::Result;

/// Base trait for all migrations.
///
/// Provides version information and metadata about a migration step.
pub trait Migration: Send + Sync {
    /// Returns the source version this migration starts from.
    fn from_version(&self) -> u32;

    /// Returns the target version this migration produces.
    fn to_version(&self) -> u32 {
        self.from_version() + 1
    }

    /// Checks if this migration can be applied to the given version.
    fn can_migrate(&self, version: u32) -> bool {
        version == self.from_version()
    }

    /// Returns a human-readable description of this migration.
    ///
    /// Used for logging and debugging purposes.
    fn description(&self) -> &str;
}

/// Migration that transforms data from one version to the next.
pub trait TypedMigration<From, To>: Migration + std::fmt::Debug {
    /// Executes the migration.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not have the shape the source
    /// version promises.
    fn migrate(&self, from: From) -> Result<To>;
}

/// A chain of migrations that can upgrade data to the latest version.
///
/// Implementations must traverse every intermediate step in order.
pub trait MigrationChain<T> {
    /// Migrates data from `current_version` to the latest version.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The data is newer than the latest supported version
    /// - No migration path exists from the current version to the latest
    /// - Any migration in the chain fails
    fn migrate_to_latest(&self, data: T, current_version: u32) -> Result<T>;

    /// Returns the version path from `from` to the latest version, empty
    /// when there is none.
    fn path_from(&self, from: u32) -> Vec<u32>;
}
