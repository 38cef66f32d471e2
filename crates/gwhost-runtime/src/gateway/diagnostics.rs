//! Human-readable failure details for `GatewayState::Failed`.

use std::fmt::Write as _;

use gwhost_core::{GatewayError, GatewayPaths};

use crate::process::ProcessSpec;

/// Compose failure details: the cause, the command that was run, where the
/// logs live and, when the child ran, the tail of its stderr.
///
/// The logs directory always appears verbatim so a user can find it.
pub fn failure_details(
    error: &GatewayError,
    spec: Option<&ProcessSpec>,
    paths: &GatewayPaths,
    stderr_tail: &str,
) -> String {
    let mut out = error.to_string();
    out.push('\n');

    if let Some(spec) = spec {
        let _ = writeln!(out, "\nCommand: {}", spec.command_line());
        if let Some(dir) = &spec.working_dir {
            let _ = writeln!(out, "Working directory: {}", dir.display());
        }
    }

    let _ = writeln!(out, "\nLogs: {}", paths.logs_dir.display());
    let _ = writeln!(out, "  stdout: {}", paths.stdout_log().display());
    let _ = writeln!(out, "  stderr: {}", paths.stderr_log().display());

    if error.child_ran() {
        let tail = stderr_tail.trim_end();
        if tail.is_empty() {
            out.push_str("\n(no stderr output captured)\n");
        } else {
            let _ = write!(out, "\nLast stderr output:\n{tail}\n");
        }
    }

    out
}
