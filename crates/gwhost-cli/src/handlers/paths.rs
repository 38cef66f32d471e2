//! Paths command handler.
//!
//! Displays every resolved location in `key = value` form for diagnostics.

use anyhow::Result;
use gwhost_core::GatewayPaths;

/// Render paths one per line.
pub fn render(paths: &GatewayPaths) -> String {
    [
        ("state_dir", paths.state_dir.clone()),
        ("config", paths.config_path.clone()),
        ("logs_dir", paths.logs_dir.clone()),
        ("stdout_log", paths.stdout_log()),
        ("stderr_log", paths.stderr_log()),
        ("migration_marker", paths.marker_path()),
        ("pid_file", paths.pid_path()),
    ]
    .iter()
    .map(|(key, path)| format!("{key} = {}", path.display()))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Execute the paths command.
pub fn execute(paths: &GatewayPaths) -> Result<()> {
    println!("{}", render(paths));
    Ok(())
}
