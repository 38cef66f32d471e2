//! File layout of one gateway state directory.

use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::data_root;

/// Resolved locations used by a supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPaths {
    /// State directory handed to the gateway; owns every other path.
    pub state_dir: PathBuf,
    /// Gateway config document.
    pub config_path: PathBuf,
    /// Directory receiving `gateway.out.log` / `gateway.err.log`.
    pub logs_dir: PathBuf,
}

impl GatewayPaths {
    /// Layout rooted at an explicit state directory.
    pub fn from_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            config_path: state_dir.join("gateway.json"),
            logs_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    /// Layout rooted at the default data root.
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self::from_state_dir(data_root()?))
    }

    /// Override the config document location (keeps the state directory).
    #[must_use]
    pub fn with_config_path(mut self, config_path: impl Into<PathBuf>) -> Self {
        self.config_path = config_path.into();
        self
    }

    /// Applied-migration marker, kept apart from the config document.
    pub fn marker_path(&self) -> PathBuf {
        marker_path_in(&self.state_dir)
    }

    /// Pid file of the running gateway child.
    pub fn pid_path(&self) -> PathBuf {
        self.state_dir.join("gateway.pid")
    }

    /// Append-mode log receiving the child's stdout.
    pub fn stdout_log(&self) -> PathBuf {
        self.logs_dir.join("gateway.out.log")
    }

    /// Append-mode log receiving the child's stderr.
    pub fn stderr_log(&self) -> PathBuf {
        self.logs_dir.join("gateway.err.log")
    }
}

/// Marker file location for a given state directory.
pub(crate) fn marker_path_in(state_dir: &Path) -> PathBuf {
    state_dir.join("config-state.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_state_dir() {
        let paths = GatewayPaths::from_state_dir("/data/gw");
        assert_eq!(paths.config_path, PathBuf::from("/data/gw/gateway.json"));
        assert_eq!(paths.logs_dir, PathBuf::from("/data/gw/logs"));
        assert_eq!(paths.marker_path(), PathBuf::from("/data/gw/config-state.json"));
        assert_eq!(paths.pid_path(), PathBuf::from("/data/gw/gateway.pid"));
        assert!(paths.stderr_log().starts_with(&paths.logs_dir));
    }

    #[test]
    fn config_override_keeps_state_dir() {
        let paths = GatewayPaths::from_state_dir("/data/gw").with_config_path("/etc/gw.json");
        assert_eq!(paths.config_path, PathBuf::from("/etc/gw.json"));
        assert_eq!(paths.marker_path(), PathBuf::from("/data/gw/config-state.json"));
    }
}
