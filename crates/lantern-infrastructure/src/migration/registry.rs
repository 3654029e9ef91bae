//! Migration registry for managing linear migration chains.
//!
//! Each version migrates through every intermediate version; there are no
//! shortcuts.

use super::traits::{MigrationChain, TypedMigration};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Registry for managing a linear chain of migrations.
///
/// Migrations are stored in order and must form a continuous chain:
/// 0 → 1 → 2 → ...
///
/// # Example
///
/// ```ignore
/// let mut registry = MigrationRegistry::new(2);
/// registry.register(Arc::new(V0ToV1));
/// registry.register(Arc::new(V1ToV2));
///
/// // Migrates through all steps: 0 → 1 → 2
/// let migrated = registry.migrate_to_latest(old_data, 0)?;
/// ```
#[derive(Debug)]
pub struct MigrationRegistry<T> {
    /// Migrations in order, forming a linear chain.
    migrations: Vec<Arc<dyn TypedMigration<T, T>>>,
    /// The latest version this registry can migrate to.
    latest_version: u32,
}

impl<T> MigrationRegistry<T> {
    pub fn new(latest_version: u32) -> Self {
        Self {
            migrations: Vec::new(),
            latest_version,
        }
    }

    /// Registers a single migration, validating chain continuity.
    ///
    /// # Panics
    ///
    /// Panics if the migration doesn't connect to the existing chain or
    /// targets a version past the latest one.
    pub fn register(&mut self, migration: Arc<dyn TypedMigration<T, T>>) {
        if let Some(last) = self.migrations.last() {
            assert_eq!(
                last.to_version(),
                migration.from_version(),
                "Migration chain broken: expected migration from {} (previous to_version), but got migration from {}. \
                 Description: '{}' (previous) -> '{}' (current)",
                last.to_version(),
                migration.from_version(),
                last.description(),
                migration.description()
            );
        }

        if migration.to_version() > self.latest_version {
            panic!(
                "Migration target version {} exceeds registry's latest version {}",
                migration.to_version(),
                self.latest_version
            );
        }

        self.migrations.push(migration);
    }

    pub fn register_all(&mut self, migrations: Vec<Arc<dyn TypedMigration<T, T>>>) {
        for migration in migrations {
            self.register(migration);
        }
    }

    pub fn latest_version(&self) -> u32 {
        self.latest_version
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    fn find_start_index(&self, from_version: u32) -> Option<usize> {
        self.migrations.iter().position(|m| m.can_migrate(from_version))
    }
}

impl<T> MigrationChain<T> for MigrationRegistry<T> {
    fn migrate_to_latest(&self, mut data: T, current_version: u32) -> Result<T> {
        if current_version == self.latest_version {
            tracing::debug!(
                "[Migration] Data is already at the latest version ({})",
                current_version
            );
            return Ok(data);
        }

        if current_version > self.latest_version {
            anyhow::bail!(
                "Data version ({}) is newer than the latest supported version ({})",
                current_version,
                self.latest_version
            );
        }

        let start_idx = self.find_start_index(current_version).ok_or_else(|| {
            let available: Vec<String> = self
                .migrations
                .iter()
                .map(|m| format!("{} -> {}", m.from_version(), m.to_version()))
                .collect();
            anyhow::anyhow!(
                "No migration found starting from version {}. Available migrations: [{}]",
                current_version,
                available.join(", ")
            )
        })?;

        tracing::info!(
            "[Migration] Migrating from {} to {} ({} steps)",
            current_version,
            self.latest_version,
            self.migrations.len() - start_idx
        );

        for (i, migration) in self.migrations[start_idx..].iter().enumerate() {
            tracing::debug!(
                "[Migration] Step {}: {} -> {} ({})",
                i + 1,
                migration.from_version(),
                migration.to_version(),
                migration.description()
            );

            data = migration.migrate(data).with_context(|| {
                format!(
                    "Migration failed at step {}: {} -> {}",
                    i + 1,
                    migration.from_version(),
                    migration.to_version()
                )
            })?;
        }

        Ok(data)
    }

    fn path_from(&self, from: u32) -> Vec<u32> {
        if from == self.latest_version {
            return vec![from];
        }
        match self.find_start_index(from) {
            Some(start_idx) => std::iter::once(from)
                .chain(self.migrations[start_idx..].iter().map(|m| m.to_version()))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::traits::Migration;

    #[derive(Debug)]
    struct AppendStep {
        from: u32,
    }

    impl Migration for AppendStep {
        fn from_version(&self) -> u32 {
            self.from
        }

        fn description(&self) -> &str {
            "append step marker"
        }
    }

    impl TypedMigration<String, String> for AppendStep {
        fn migrate(&self, from: String) -> Result<String> {
            Ok(format!("{} -> v{}", from, self.to_version()))
        }
    }

    #[derive(Debug)]
    struct FailingStep;

    impl Migration for FailingStep {
        fn from_version(&self) -> u32 {
            0
        }

        fn description(&self) -> &str {
            "always fails"
        }
    }

    impl TypedMigration<String, String> for FailingStep {
        fn migrate(&self, _from: String) -> Result<String> {
            anyhow::bail!("bad shape")
        }
    }

    #[test]
    fn test_already_at_latest_version_is_identity() {
        let registry: MigrationRegistry<String> = MigrationRegistry::new(1);
        let result = registry.migrate_to_latest("data".to_string(), 1).unwrap();
        assert_eq!(result, "data");
        assert_eq!(registry.path_from(1), vec![1]);
    }

    #[test]
    fn test_migrate_through_all_steps() {
        let mut registry = MigrationRegistry::new(3);
        registry.register_all(vec![
            Arc::new(AppendStep { from: 0 }),
            Arc::new(AppendStep { from: 1 }),
            Arc::new(AppendStep { from: 2 }),
        ]);

        let result = registry.migrate_to_latest("start".to_string(), 1).unwrap();
        assert_eq!(result, "start -> v2 -> v3");
        assert_eq!(registry.path_from(0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_newer_data_is_rejected() {
        let registry: MigrationRegistry<String> = MigrationRegistry::new(1);
        let err = registry.migrate_to_latest("x".to_string(), 5).unwrap_err();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let registry: MigrationRegistry<String> = MigrationRegistry::new(2);
        assert!(registry.migrate_to_latest("x".to_string(), 0).is_err());
        assert!(registry.path_from(0).is_empty());
    }

    #[test]
    fn test_failed_step_reports_context() {
        let mut registry = MigrationRegistry::new(1);
        registry.register(Arc::new(FailingStep));
        let err = registry.migrate_to_latest("x".to_string(), 0).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Migration failed at step 1: 0 -> 1"));
        assert!(message.contains("bad shape"));
    }

    #[test]
    #[should_panic(expected = "Migration chain broken")]
    fn test_register_broken_chain() {
        let mut registry = MigrationRegistry::new(3);
        registry.register(Arc::new(AppendStep { from: 0 }));
        registry.register(Arc::new(AppendStep { from: 2 }));
    }
}
