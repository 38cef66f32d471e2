//! Platform implementation of [`HostControl`].

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use gwhost_core::paths::{DirectoryCreationStrategy, ensure_directory};
use gwhost_core::{ControlError, HostControl};
use tracing::info;
use url::Url;

/// Opens paths and links with the platform default handler and relaunches
/// by re-executing the current binary.
#[derive(Debug, Clone)]
pub struct DesktopHostControl {
    relaunch_args: Vec<OsString>,
}

impl DesktopHostControl {
    /// Relaunch with the arguments this process was started with.
    pub fn new() -> Self {
        Self {
            relaunch_args: std::env::args_os().skip(1).collect(),
        }
    }

    /// Relaunch with explicit arguments.
    pub const fn with_relaunch_args(relaunch_args: Vec<OsString>) -> Self {
        Self { relaunch_args }
    }
}

impl Default for DesktopHostControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `raw` and accept only `http` and `https` links.
pub fn validate_external_url(raw: &str) -> Result<Url, ControlError> {
    let url = Url::parse(raw.trim()).map_err(|e| ControlError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ControlError::UnsupportedScheme(other.to_string())),
    }
}

impl HostControl for DesktopHostControl {
    fn open_logs_dir(&self, logs_dir: &Path) -> Result<(), ControlError> {
        let target = logs_dir.display().to_string();
        ensure_directory(logs_dir, DirectoryCreationStrategy::AutoCreate).map_err(|e| {
            ControlError::Open {
                target: target.clone(),
                reason: e.to_string(),
            }
        })?;

        open::that(logs_dir).map_err(|e| ControlError::Open {
            target,
            reason: e.to_string(),
        })
    }

    fn open_external(&self, url: &str) -> Result<(), ControlError> {
        let url = validate_external_url(url)?;
        open::that(url.as_str()).map_err(|e| ControlError::Open {
            target: url.to_string(),
            reason: e.to_string(),
        })
    }

    // The caller exits right after; the replacement is never reaped here.
    #[allow(clippy::zombie_processes)]
    fn relaunch(&self) -> Result<(), ControlError> {
        let exe = std::env::current_exe().map_err(|e| ControlError::Relaunch(e.to_string()))?;
        let child = Command::new(&exe)
            .args(&self.relaunch_args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| ControlError::Relaunch(e.to_string()))?;

        info!(pid = %child.id(), exe = %exe.display(), "Relaunched host");
        Ok(())
    }
}
