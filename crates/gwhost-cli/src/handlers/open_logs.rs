//! Open-logs command handler.

use anyhow::Result;
use gwhost_core::{GatewayPaths, HostControl};

use crate::error::CliError;

/// Reveal the logs directory through `control`.
pub fn execute(control: &dyn HostControl, paths: &GatewayPaths) -> Result<()> {
    control
        .open_logs_dir(&paths.logs_dir)
        .map_err(CliError::from)?;
    println!("Opened {}", paths.logs_dir.display());
    Ok(())
}
