//! Core domain types for the gwhost gateway supervisor.
//!
//! This crate holds everything that does not touch processes or sockets:
//!
//! - [`state`] - the `Starting → Ready | Failed` lifecycle value
//! - [`paths`] / [`settings`] - where state lives and how the run is tuned
//! - [`config`] - the gateway config document and its first-run bootstrap
//! - [`token`] - reuse-or-mint auth token provisioning
//! - [`migrations`] - the versioned, exactly-once config migration engine
//! - [`ports`] - traits implemented by adapters (host control)

pub mod config;
pub mod error;
pub mod migrations;
pub mod paths;
pub mod ports;
pub mod settings;
pub mod state;
pub mod token;

// Re-export commonly used types for convenience
pub use config::{ConfigDocument, ConfigError, GatewayBootstrap, ensure_gateway_config_file};
pub use error::GatewayError;
pub use migrations::{
    ConfigMigration, ConfigMigrationEngine, MigrationError, MigrationOutcome, MigrationReport,
    MigrationSet,
};
pub use paths::{GatewayPaths, PathError};
pub use ports::{ControlError, HostControl};
pub use settings::{SettingsError, SupervisorSettings, validate_settings};
pub use state::{GatewayState, StateError, gateway_url};
pub use token::{ResolvedToken, TokenError, TokenProvisioner, TokenSource};
