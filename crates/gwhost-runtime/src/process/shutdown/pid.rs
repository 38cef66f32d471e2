//! Kill a stale gateway by PID (no `Child` handle, so no reaping).

use std::io;

#[cfg(unix)]
use std::time::Duration;
#[cfg(unix)]
use tokio::time::sleep;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

#[cfg(unix)]
const POLL_INTERVAL: Duration = Duration::from_millis(100);
#[cfg(unix)]
const POLL_ATTEMPTS: u32 = 20;

/// Kill a process by PID with SIGTERM → SIGKILL escalation.
///
/// Caller must verify the PID is ours first. Returns `Ok(())` if the process
/// was killed or was already gone.
pub async fn kill_pid(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        kill_pid_unix(pid).await
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stale gateway cleanup is not implemented on this platform",
        ))
    }
}

#[cfg(unix)]
async fn kill_pid_unix(pid: u32) -> io::Result<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    let nix_pid = Pid::from_raw(raw);

    for sig in [Signal::SIGTERM, Signal::SIGKILL] {
        match signal::kill(nix_pid, sig) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Ok(()),
            Err(e) => return Err(io::Error::other(e)),
        }

        for _ in 0..POLL_ATTEMPTS {
            sleep(POLL_INTERVAL).await;
            if signal::kill(nix_pid, None) == Err(Errno::ESRCH) {
                return Ok(());
            }
        }
    }

    Err(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("process {pid} did not exit after SIGKILL"),
    ))
}
