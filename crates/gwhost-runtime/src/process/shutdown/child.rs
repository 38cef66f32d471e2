//! Graceful shutdown of a `tokio::process::Child` with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Grace period between SIGTERM and SIGKILL.
pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_millis(1500);

/// Shut down a child process, escalating to a forced kill after `grace`.
///
/// # Strategy
/// 1. If the child already exited, return its status
/// 2. Send SIGTERM and wait up to `grace`
/// 3. If still running, force kill
/// 4. Wait for reaping (required to avoid zombies)
///
/// # Platform behavior
/// - Unix: SIGTERM via nix, then SIGKILL via `.kill()`
/// - Windows: immediate `.kill()` (no graceful signal available)
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    #[cfg(unix)]
    {
        shutdown_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        shutdown_windows(child).await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let raw_pid = child
        .id()
        .and_then(|pid| i32::try_from(pid).ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "child has no PID"))?;

    if let Err(e) = signal::kill(Pid::from_raw(raw_pid), Signal::SIGTERM) {
        // Exited between try_wait and the signal
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    child.kill().await?;
    child.wait().await
}

#[cfg(not(unix))]
async fn shutdown_windows(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_responds_to_sigterm() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();

        let started = std::time::Instant::now();
        let status = shutdown_child(&mut child, DEFAULT_TERMINATION_GRACE)
            .await
            .unwrap();
        assert!(!status.success());
        assert!(started.elapsed() < DEFAULT_TERMINATION_GRACE);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_escalates_when_sigterm_is_ignored() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30"])
            .spawn()
            .unwrap();
        sleep(Duration::from_millis(100)).await;

        let started = std::time::Instant::now();
        shutdown_child(&mut child, Duration::from_millis(200))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(child.try_wait().unwrap().is_some());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_handles_already_exited() {
        let mut child = Command::new("true").spawn().unwrap();
        sleep(Duration::from_millis(100)).await;

        let status = shutdown_child(&mut child, DEFAULT_TERMINATION_GRACE)
            .await
            .unwrap();
        assert!(status.success());
    }
}
