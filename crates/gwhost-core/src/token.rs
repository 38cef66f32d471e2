//! Gateway auth token provisioning.
//!
//! A token found in an existing config is always reused so client sessions
//! survive restarts. A new one is minted only when none is found.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, info};

use crate::config::ConfigDocument;

/// Bytes of OS entropy per minted token.
pub const TOKEN_BYTES: usize = 32;

/// Config path holding the gateway auth token.
pub const TOKEN_KEY_PATH: [&str; 3] = ["gateway", "auth", "token"];

/// Pre-`auth` section location, still honored until migrated.
pub const LEGACY_TOKEN_KEY_PATH: [&str; 2] = ["gateway", "authToken"];

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Read from the existing config file.
    Existing,
    /// Freshly generated for this run.
    Minted,
}

/// Token plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub value: String,
    pub source: TokenSource,
}

/// Token generation failure.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to gather entropy for gateway token: {0}")]
    Entropy(String),
}

/// Resolves the gateway auth token for a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenProvisioner;

impl TokenProvisioner {
    /// Reuse the token from `config_path` if readable, otherwise mint one.
    pub fn resolve(config_path: &Path) -> Result<ResolvedToken, TokenError> {
        if let Some(value) = Self::read_existing(config_path) {
            debug!(path = %config_path.display(), "Reusing gateway token from config");
            return Ok(ResolvedToken {
                value,
                source: TokenSource::Existing,
            });
        }

        let value = Self::mint()?;
        info!("Minted new gateway token");
        Ok(ResolvedToken {
            value,
            source: TokenSource::Minted,
        })
    }

    /// Token stored in the config at `config_path`, if any.
    ///
    /// Falls back to the legacy `gateway.authToken` key. Missing files,
    /// unparsable documents and blank tokens all read as "no token".
    pub fn read_existing(config_path: &Path) -> Option<String> {
        if !config_path.exists() {
            return None;
        }

        let doc = match ConfigDocument::read(config_path) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(path = %config_path.display(), error = %e, "Config unreadable, ignoring stored token");
                return None;
            }
        };

        [&TOKEN_KEY_PATH[..], &LEGACY_TOKEN_KEY_PATH[..]]
            .into_iter()
            .filter_map(|key| doc.get_str(key))
            .map(str::trim)
            .find(|token| !token.is_empty())
            .map(ToString::to_string)
    }

    /// Mint a URL-safe token from OS entropy.
    pub fn mint() -> Result<String, TokenError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| TokenError::Entropy(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}
