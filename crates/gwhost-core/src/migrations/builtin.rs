//! Migrations shipped with this release.
//!
//! Append new migrations with the next version number; never renumber or
//! remove a released one.

use serde_json::{Value, json};

use super::migration::{ConfigMigration, MigrationSet};
use crate::config::ConfigDocument;
use crate::token::{LEGACY_TOKEN_KEY_PATH, TOKEN_KEY_PATH};

/// The built-in registry.
pub fn builtin_migrations() -> MigrationSet {
    let migrations = [
        ConfigMigration::new(1, "Default gateway mode and bind address", |doc| {
            let mode = doc.set_if_absent(&["gateway", "mode"], json!("local"))?;
            let bind = doc.set_if_absent(&["gateway", "bind"], json!("loopback"))?;
            Ok(mode || bind)
        }),
        ConfigMigration::new(2, "Default gateway auth mode to token", |doc| {
            Ok(doc.set_if_absent(&["gateway", "auth", "mode"], json!("token"))?)
        }),
        ConfigMigration::new(3, "Move gateway.authToken to gateway.auth.token", |doc| {
            move_legacy_token(doc)
        }),
    ];

    // Versions above are literal, positive and distinct.
    MigrationSet::new(migrations).unwrap_or_default()
}

fn move_legacy_token(doc: &mut ConfigDocument) -> anyhow::Result<bool> {
    let Some(legacy) = doc.get(&LEGACY_TOKEN_KEY_PATH).cloned() else {
        return Ok(false);
    };

    let has_current = doc
        .get_str(&TOKEN_KEY_PATH)
        .is_some_and(|token| !token.trim().is_empty());

    if !has_current {
        if let Value::String(token) = legacy {
            if !token.trim().is_empty() {
                doc.set(&TOKEN_KEY_PATH, Value::String(token))?;
            }
        }
    }

    doc.remove(&LEGACY_TOKEN_KEY_PATH);
    Ok(true)
}
