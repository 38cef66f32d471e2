//! Process verification to ensure a PID still belongs to the gateway.

use std::path::{Path, PathBuf};

#[cfg(target_os = "macos")]
use sysinfo::System;

#[cfg(target_os = "linux")]
use std::fs;

/// Check if `pid` is the gateway process recorded with `started_at`.
///
/// Both the executable and the start time must match. An executable match
/// alone is not enough: a gateway launched through an interpreter (`sh`,
/// `node`) shares its executable with unrelated processes that may have
/// picked up a recycled PID. A missing start time never matches.
///
/// `program` may be a bare name; it is resolved on `PATH` first.
///
/// # Platform behavior
/// - **macOS**: Uses `sysinfo` for executable path and start time
/// - **Linux**: Reads `/proc/<pid>/exe` and `/proc/<pid>/stat`
/// - **Other**: Always returns `false` (conservative)
pub fn is_gateway_process(pid: u32, program: &Path, started_at: Option<u64>) -> bool {
    let Some(expected_start) = started_at else {
        return false;
    };
    if process_start_time(pid) != Some(expected_start) {
        return false;
    }

    let Some(expected) = resolve_program(program) else {
        return false;
    };

    let Some(actual) = executable_of(pid) else {
        return false;
    };

    match (actual.canonicalize(), expected.canonicalize()) {
        (Ok(actual), Ok(expected)) => actual == expected,
        _ => false,
    }
}

fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return Some(program.to_path_buf());
    }
    which::which(program).ok()
}

#[cfg(target_os = "linux")]
fn executable_of(pid: u32) -> Option<PathBuf> {
    fs::read_link(format!("/proc/{pid}/exe")).ok()
}

#[cfg(target_os = "macos")]
fn executable_of(pid: u32) -> Option<PathBuf> {
    let sys = System::new_all();
    sys.process(sysinfo::Pid::from_u32(pid))
        .and_then(|process| process.exe())
        .map(Path::to_path_buf)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn executable_of(_pid: u32) -> Option<PathBuf> {
    None
}

/// Start time of `pid`, stable for the life of the process.
///
/// Linux reports clock ticks since boot (`/proc/<pid>/stat` field 22),
/// macOS seconds since the epoch. Only compare values from the same host.
#[cfg(target_os = "linux")]
pub fn process_start_time(pid: u32) -> Option<u64> {
    let stat = fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    parse_stat_start_time(&stat)
}

#[cfg(target_os = "macos")]
pub fn process_start_time(pid: u32) -> Option<u64> {
    let sys = System::new_all();
    sys.process(sysinfo::Pid::from_u32(pid))
        .map(sysinfo::Process::start_time)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn process_start_time(_pid: u32) -> Option<u64> {
    None
}

/// Field 22 of a `/proc/<pid>/stat` line. The command name (field 2) may
/// contain spaces and parentheses, so fields are counted from its closing
/// parenthesis.
#[cfg(any(target_os = "linux", test))]
fn parse_stat_start_time(stat: &str) -> Option<u64> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().nth(19)?.parse().ok()
}

/// Check if a PID exists (without verifying it's our process).
///
/// Uses `kill` with the null signal, which checks existence only.
#[cfg(unix)]
pub fn pid_exists(pid: u32) -> bool {
    use nix::sys::signal;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };

    match signal::kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        // Exists but we lack permission
        Err(_) => true,
    }
}

#[cfg(not(unix))]
pub fn pid_exists(_pid: u32) -> bool {
    false
}
