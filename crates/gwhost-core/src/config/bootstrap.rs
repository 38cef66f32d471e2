//! Minimal config bootstrap for a first run.

use std::path::Path;

use serde_json::json;
use tracing::{debug, info};

use super::document::ConfigDocument;
use super::error::ConfigError;

/// Values written into a freshly bootstrapped config.
#[derive(Debug, Clone, Copy)]
pub struct GatewayBootstrap<'a> {
    pub port: u16,
    pub token: &'a str,
}

/// The smallest config the gateway accepts: local mode on loopback with
/// token auth.
pub fn minimal_gateway_config(bootstrap: GatewayBootstrap<'_>) -> ConfigDocument {
    let value = json!({
        "gateway": {
            "mode": "local",
            "bind": "loopback",
            "port": bootstrap.port,
            "auth": {
                "mode": "token",
                "token": bootstrap.token,
            },
        },
    });

    match value {
        serde_json::Value::Object(root) => ConfigDocument::from(root),
        _ => ConfigDocument::new(),
    }
}

/// Write a minimal config at `path` unless a file already exists there.
///
/// Returns `true` when a file was created. An existing file is never
/// touched, whatever its contents.
pub fn ensure_gateway_config_file(
    path: &Path,
    bootstrap: GatewayBootstrap<'_>,
) -> Result<bool, ConfigError> {
    if path.exists() {
        debug!(path = %path.display(), "Gateway config already present");
        return Ok(false);
    }

    minimal_gateway_config(bootstrap).write(path)?;
    info!(path = %path.display(), port = %bootstrap.port, "Wrote minimal gateway config");
    Ok(true)
}
