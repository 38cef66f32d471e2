//! Migration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while registering or running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Version 0 is reserved for "nothing applied".
    #[error("Migration versions must be positive (\"{description}\" uses 0)")]
    ZeroVersion { description: String },

    /// Two migrations share a version.
    #[error("Duplicate migration version {0}")]
    DuplicateVersion(u32),

    /// A migration's `apply` returned an error.
    #[error("Migration {version} failed: {reason}")]
    Apply { version: u32, reason: String },

    /// The migrated document could not be persisted.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The version marker could not be persisted.
    #[error("Failed to write migration marker {path}: {source}")]
    MarkerWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
