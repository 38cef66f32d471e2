//! Versioned, idempotent config migrations.
//!
//! Migrations patch the gateway config structurally as the host application
//! is upgraded. Each one runs at most once: the highest completed version is
//! persisted in a marker file next to (not inside) the config document.
//!
//! # Structure
//!
//! - `ConfigMigration` / `MigrationSet` - a validated, ordered registry
//! - `ConfigMigrationEngine` - reads the marker, applies pending migrations,
//!   persists the document and the new marker
//! - `builtin_migrations` - the migrations shipped with this release

mod builtin;
mod engine;
mod error;
mod marker;
mod migration;

pub use builtin::builtin_migrations;
pub use engine::{ConfigMigrationEngine, MigrationFailure, MigrationOutcome, MigrationReport};
pub use error::MigrationError;
pub use marker::{VersionMarker, read_marker, write_marker};
pub use migration::{ConfigMigration, MigrationSet};
