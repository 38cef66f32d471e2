//! Persisted "applied up to" version marker.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::MigrationError;
use crate::config::write_atomic;
use crate::paths::marker_path_in;

/// Marker file content: `{ "configVersion": <n> }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMarker {
    pub config_version: u32,
}

/// Highest applied migration version recorded in `state_dir`.
///
/// A missing or unparsable marker reads as 0.
pub fn read_marker(state_dir: &Path) -> u32 {
    let path = marker_path_in(state_dir);
    let Ok(text) = fs::read_to_string(&path) else {
        return 0;
    };

    match serde_json::from_str::<VersionMarker>(&text) {
        Ok(marker) => marker.config_version,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Ignoring unparsable migration marker");
            0
        }
    }
}

/// Persist `version` as the applied-up-to marker in `state_dir`.
pub fn write_marker(state_dir: &Path, version: u32) -> Result<(), MigrationError> {
    let path = marker_path_in(state_dir);
    let marker = VersionMarker {
        config_version: version,
    };
    let mut text = serde_json::to_string_pretty(&marker).map_err(crate::config::ConfigError::from)?;
    text.push('\n');

    write_atomic(&path, text.as_bytes())
        .map_err(|source| MigrationError::MarkerWrite { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_marker_reads_as_zero() {
        let temp = tempdir().unwrap();
        assert_eq!(read_marker(temp.path()), 0);
    }

    #[test]
    fn corrupt_marker_reads_as_zero() {
        let temp = tempdir().unwrap();
        fs::write(marker_path_in(temp.path()), "{\"configVersion\": \"three\"}").unwrap();
        assert_eq!(read_marker(temp.path()), 0);
    }

    #[test]
    fn marker_uses_camel_case_key() {
        let temp = tempdir().unwrap();
        write_marker(temp.path(), 7).unwrap();

        let text = fs::read_to_string(marker_path_in(temp.path())).unwrap();
        assert!(text.contains("\"configVersion\": 7"));
        assert_eq!(read_marker(temp.path()), 7);
    }
}
