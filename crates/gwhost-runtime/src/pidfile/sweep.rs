//! Startup cleanup of a gateway left running by a crashed host.

use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use super::io::{delete_pidfile, read_pidfile};
use super::verify::is_gateway_process;
use crate::process::kill_pid;

/// What the sweep found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// No PID file present.
    Clean,
    /// A PID file existed but its process was gone or not ours.
    StaleFileRemoved,
    /// A verified stale gateway was killed.
    Killed { pid: u32, port: u16 },
}

/// Reap a stale gateway recorded in `pid_path`.
///
/// # Strategy
/// 1. Read the PID file (unparsable files are removed)
/// 2. If the PID still runs `program` and started at the recorded time,
///    kill it with SIGTERM → SIGKILL
/// 3. Otherwise only delete the PID file
pub async fn reap_stale_gateway(pid_path: &Path, program: &Path) -> io::Result<SweepOutcome> {
    let data = match read_pidfile(pid_path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No stale gateway PID file found");
            return Ok(SweepOutcome::Clean);
        }
        Err(e) => {
            debug!(path = %pid_path.display(), error = %e, "Removing unreadable PID file");
            delete_pidfile(pid_path)?;
            return Ok(SweepOutcome::StaleFileRemoved);
        }
    };

    if !is_gateway_process(data.pid, program, data.started_at) {
        debug!(
            "PID {} is not our gateway, removing stale PID file",
            data.pid
        );
        delete_pidfile(pid_path)?;
        return Ok(SweepOutcome::StaleFileRemoved);
    }

    info!(
        "Killing stale gateway (PID {}, port {}) from a previous run",
        data.pid, data.port
    );
    if let Err(e) = kill_pid(data.pid).await {
        warn!(
            "Failed to kill stale gateway PID {}: {}. Removing stale PID file.",
            data.pid, e
        );
        delete_pidfile(pid_path)?;
        return Ok(SweepOutcome::StaleFileRemoved);
    }

    delete_pidfile(pid_path)?;
    Ok(SweepOutcome::Killed {
        pid: data.pid,
        port: data.port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pidfile::{PidFileData, pid_exists, process_start_time, write_pidfile};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_pidfile_is_clean() {
        let temp = tempdir().unwrap();
        let outcome = reap_stale_gateway(&temp.path().join("gateway.pid"), Path::new("sh"))
            .await
            .unwrap();
        assert_eq!(outcome, SweepOutcome::Clean);
    }

    #[tokio::test]
    async fn dead_pid_only_removes_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gateway.pid");
        write_pidfile(
            &path,
            PidFileData {
                pid: 999_999,
                port: 9999,
                started_at: Some(1),
            },
        )
        .unwrap();

        let outcome = reap_stale_gateway(&path, Path::new("sh")).await.unwrap();
        assert_eq!(outcome, SweepOutcome::StaleFileRemoved);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn garbage_pidfile_is_removed() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gateway.pid");
        fs::write(&path, "not a pid").unwrap();

        let outcome = reap_stale_gateway(&path, Path::new("sh")).await.unwrap();
        assert_eq!(outcome, SweepOutcome::StaleFileRemoved);
        assert!(!path.exists());
    }

    #[tokio::test]
    #[cfg(target_os = "linux")]
    async fn verified_stale_gateway_is_killed() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gateway.pid");

        let mut child = tokio::process::Command::new("sleep")
            .arg("60")
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        let reaper = tokio::spawn(async move { child.wait().await });

        let record = PidFileData {
            pid,
            port: 4242,
            started_at: process_start_time(pid),
        };
        write_pidfile(&path, record).unwrap();
        let outcome = reap_stale_gateway(&path, Path::new("sleep")).await.unwrap();

        assert_eq!(outcome, SweepOutcome::Killed { pid, port: 4242 });
        assert!(!path.exists());
        assert!(!reaper.await.unwrap().unwrap().success());
    }

    #[tokio::test]
    #[cfg(target_os = "linux")]
    async fn recycled_pid_running_same_interpreter_is_spared() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gateway.pid");

        let mut bystander = tokio::process::Command::new("sh")
            .args(["-c", "sleep 30; true"])
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let pid = bystander.id().unwrap();
        let actual_start = process_start_time(pid).unwrap();

        // Same executable, but recorded for a different process, or by a
        // host that could not read start times.
        for started_at in [Some(actual_start + 1), None] {
            write_pidfile(
                &path,
                PidFileData {
                    pid,
                    port: 4242,
                    started_at,
                },
            )
            .unwrap();

            let outcome = reap_stale_gateway(&path, Path::new("sh")).await.unwrap();
            assert_eq!(outcome, SweepOutcome::StaleFileRemoved);
            assert!(!path.exists());
        }

        assert!(bystander.try_wait().unwrap().is_none());
        assert!(pid_exists(pid));
        bystander.kill().await.unwrap();
    }
}
