//! Platform-specific path resolution.
//!
//! Private helpers for resolving platform-appropriate paths. Public API is
//! exposed through sibling modules.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable that overrides the data root.
pub const DATA_DIR_ENV: &str = "GWHOST_DATA_DIR";

/// Directory name used under the platform data directory.
const APP_DIR_NAME: &str = "gwhost";

/// Get the root directory for gateway state (config, logs, markers).
///
/// Resolution order:
/// 1. `GWHOST_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/gwhost`)
/// 3. `~/.gwhost`
///
/// The directory is not created here; callers use `ensure_directory`.
pub fn data_root() -> Result<PathBuf, PathError> {
    resolve_data_root(env::var(DATA_DIR_ENV).ok())
}

fn resolve_data_root(override_dir: Option<String>) -> Result<PathBuf, PathError> {
    if let Some(raw) = override_dir.filter(|s| !s.trim().is_empty()) {
        return normalize_user_path(&raw);
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join(APP_DIR_NAME));
    }

    let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
    Ok(home.join(format!(".{APP_DIR_NAME}")))
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed.starts_with("~/") || trimmed == "~" {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_platform_default() {
        let root = resolve_data_root(Some("/tmp/gwhost-test".to_string())).unwrap();
        assert_eq!(root, PathBuf::from("/tmp/gwhost-test"));
    }

    #[test]
    fn blank_override_is_ignored() {
        let root = resolve_data_root(Some("   ".to_string())).unwrap();
        assert!(root.ends_with(APP_DIR_NAME) || root.ends_with(".gwhost"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let path = normalize_user_path("relative/dir").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("relative/dir"));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(normalize_user_path("  "), Err(PathError::EmptyPath)));
    }
}
