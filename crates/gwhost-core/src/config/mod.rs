//! Gateway config document handling.
//!
//! The config is an arbitrary JSON object owned by the gateway. This crate
//! only bootstraps a minimal one and patches it structurally during
//! migrations; it never validates the schema.

mod atomic;
mod bootstrap;
mod document;
mod error;

pub use atomic::write_atomic;
pub use bootstrap::{GatewayBootstrap, ensure_gateway_config_file, minimal_gateway_config};
pub use document::ConfigDocument;
pub use error::ConfigError;
