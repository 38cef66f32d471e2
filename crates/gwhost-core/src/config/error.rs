//! Config document error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading, parsing or writing the gateway config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid JSON.
    #[error("Config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The text is JSON but the root is not an object.
    #[error("Config root must be an object, found {0}")]
    NotAnObject(&'static str),

    /// A nested key exists but holds a non-object value.
    #[error("Config key `{0}` exists but is not an object")]
    NotAnObjectAt(String),

    /// An empty key path was supplied.
    #[error("Config key path cannot be empty")]
    EmptyKeyPath,
}
