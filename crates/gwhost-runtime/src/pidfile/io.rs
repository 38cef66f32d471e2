//! Atomic PID file I/O operations.
//!
//! Format: line-based text file
//! ```text
//! <pid>
//! <port>
//! <start time>   (optional; absent when the OS did not report one)
//! ```

use std::fs;
use std::io;
use std::path::Path;

use gwhost_core::config::write_atomic;

/// PID file content parsed from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidFileData {
    pub pid: u32,
    pub port: u16,
    /// Process start time in the units of
    /// [`process_start_time`](super::process_start_time). Guards against a
    /// recycled PID.
    pub started_at: Option<u64>,
}

/// Write the PID file atomically.
pub fn write_pidfile(path: &Path, data: PidFileData) -> io::Result<()> {
    let mut content = format!("{}\n{}\n", data.pid, data.port);
    if let Some(started_at) = data.started_at {
        content.push_str(&format!("{started_at}\n"));
    }
    write_atomic(path, content.as_bytes())
}

/// Read PID file content.
pub fn read_pidfile(path: &Path) -> io::Result<PidFileData> {
    let content = fs::read_to_string(path)?;
    parse_pidfile_content(&content)
}

/// Delete the PID file (idempotent - no error if missing).
pub fn delete_pidfile(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn parse_pidfile_content(content: &str) -> io::Result<PidFileData> {
    let mut lines = content.lines();

    let pid = lines
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|pid| *pid != 0)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing or invalid PID"))?;

    let port = lines
        .next()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing or invalid port"))?;

    let started_at = match lines.next().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "invalid process start time")
        })?),
        None => None,
    };

    Ok(PidFileData {
        pid,
        port,
        started_at,
    })
}
