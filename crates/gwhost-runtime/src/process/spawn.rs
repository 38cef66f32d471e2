//! Spawning and owning the gateway child process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use gwhost_core::GatewayError;
use tokio::fs::{File, OpenOptions};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::shutdown::shutdown_child;
use super::stream::spawn_log_pump;
use super::tail::TailBuffer;

/// Everything needed to launch one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
    /// Variables layered over the inherited environment, in order.
    pub env: Vec<(OsString, OsString)>,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
}

impl ProcessSpec {
    /// Program plus arguments as one human-readable line.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Whether a child has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPoll {
    Running,
    Exited(ExitStatus),
    /// Already terminated through [`SupervisedProcess::terminate`].
    Released,
}

/// A spawned child whose output is being pumped to log files.
///
/// Dropping it kills the child; [`terminate`](Self::terminate) shuts it
/// down gracefully and is safe to call more than once.
#[derive(Debug)]
pub struct SupervisedProcess {
    pid: u32,
    child: Mutex<Option<Child>>,
    pumps: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

/// Spawn `spec`, appending stdout/stderr to its log files and mirroring
/// stderr into `tail`.
pub async fn spawn_process(
    spec: &ProcessSpec,
    tail: &TailBuffer,
) -> Result<SupervisedProcess, GatewayError> {
    let spawn_error = |reason: String| GatewayError::Spawn {
        program: spec.program.display().to_string(),
        reason,
    };

    let stdout_log = open_log(&spec.stdout_log)
        .await
        .map_err(|e| spawn_error(format!("cannot open {}: {e}", spec.stdout_log.display())))?;
    let stderr_log = open_log(&spec.stderr_log)
        .await
        .map_err(|e| spawn_error(format!("cannot open {}: {e}", spec.stderr_log.display())))?;

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .envs(spec.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| spawn_error(e.to_string()))?;
    let pid = child
        .id()
        .ok_or_else(|| spawn_error("child exited before its PID was read".to_string()))?;
    info!(pid = %pid, command = %spec.command_line(), "Spawned gateway process");

    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(spawn_log_pump(stdout, stdout_log, "stdout", None));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(spawn_log_pump(stderr, stderr_log, "stderr", Some(tail.clone())));
    }

    Ok(SupervisedProcess {
        pid,
        child: Mutex::new(Some(child)),
        pumps: std::sync::Mutex::new(pumps),
    })
}

async fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    OpenOptions::new().create(true).append(true).open(path).await
}

impl SupervisedProcess {
    /// OS process id recorded at spawn.
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Non-blocking exit check.
    pub async fn poll_exit(&self) -> ExitPoll {
        let mut guard = self.child.lock().await;
        let Some(child) = guard.as_mut() else {
            return ExitPoll::Released;
        };
        match child.try_wait() {
            Ok(Some(status)) => ExitPoll::Exited(status),
            Ok(None) => ExitPoll::Running,
            Err(e) => {
                debug!(pid = %self.pid, error = %e, "try_wait failed, assuming still running");
                ExitPoll::Running
            }
        }
    }

    /// Resolve once the child exits on its own.
    ///
    /// Returns `None` if the child was terminated through this handle.
    /// Polls so the lock is never held across the wait.
    pub async fn wait_for_exit(&self, poll: Duration) -> Option<ExitStatus> {
        loop {
            match self.poll_exit().await {
                ExitPoll::Running => sleep(poll).await,
                ExitPoll::Exited(status) => return Some(status),
                ExitPoll::Released => return None,
            }
        }
    }

    /// Give the log pumps up to `limit` to drain what the child wrote.
    pub async fn settle_output(&self, limit: Duration) {
        let pumps: Vec<_> = self
            .pumps
            .lock()
            .map(|mut pumps| pumps.drain(..).collect())
            .unwrap_or_default();
        if pumps.is_empty() {
            return;
        }

        let drained = timeout(limit, async {
            for pump in pumps {
                let _ = pump.await;
            }
        })
        .await;
        if drained.is_err() {
            debug!(pid = %self.pid, "Log pumps still busy after settle timeout");
        }
    }

    /// Terminate the child: SIGTERM, then a forced kill after `grace`.
    ///
    /// Idempotent: later calls return `None` without touching anything.
    pub async fn terminate(&self, grace: Duration) -> Option<ExitStatus> {
        let mut child = self.child.lock().await.take()?;

        match shutdown_child(&mut child, grace).await {
            Ok(status) => {
                info!(pid = %self.pid, %status, "Gateway process stopped");
                Some(status)
            }
            Err(e) => {
                warn!(pid = %self.pid, error = %e, "Failed to stop gateway process cleanly");
                None
            }
        }
    }
}

/// Human-readable exit status, naming the signal on Unix.
pub fn describe_exit(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("killed by signal {signal}");
        }
    }

    status.to_string()
}
