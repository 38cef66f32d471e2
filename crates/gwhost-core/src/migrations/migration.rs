//! Migration definition and ordered registry.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use super::error::MigrationError;
use crate::config::ConfigDocument;

type ApplyFn = dyn Fn(&mut ConfigDocument) -> anyhow::Result<bool> + Send + Sync;

/// One versioned structural patch of the config document.
///
/// `apply` mutates the document and reports whether it changed anything.
/// It must be idempotent: a failed run is retried from the start on the
/// next launch.
pub struct ConfigMigration {
    version: u32,
    description: String,
    apply: Box<ApplyFn>,
}

impl ConfigMigration {
    /// Create a migration.
    pub fn new<F>(version: u32, description: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&mut ConfigDocument) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self {
            version,
            description: description.into(),
            apply: Box::new(apply),
        }
    }

    pub const fn version(&self) -> u32 {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the patch against `doc`.
    pub fn apply(&self, doc: &mut ConfigDocument) -> anyhow::Result<bool> {
        (self.apply)(doc)
    }
}

impl fmt::Debug for ConfigMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigMigration")
            .field("version", &self.version)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Migrations keyed by version, validated on construction.
#[derive(Debug, Default)]
pub struct MigrationSet {
    by_version: BTreeMap<u32, ConfigMigration>,
}

impl MigrationSet {
    /// Build a set, rejecting version 0 and duplicates.
    pub fn new(migrations: impl IntoIterator<Item = ConfigMigration>) -> Result<Self, MigrationError> {
        let mut by_version = BTreeMap::new();
        for migration in migrations {
            if migration.version == 0 {
                return Err(MigrationError::ZeroVersion {
                    description: migration.description,
                });
            }
            let version = migration.version;
            if by_version.insert(version, migration).is_some() {
                return Err(MigrationError::DuplicateVersion(version));
            }
        }
        Ok(Self { by_version })
    }

    /// Migrations with `version > after`, ascending.
    pub fn pending(&self, after: u32) -> impl Iterator<Item = &ConfigMigration> {
        self.by_version
            .range((Bound::Excluded(after), Bound::Unbounded))
            .map(|(_, migration)| migration)
    }

}
