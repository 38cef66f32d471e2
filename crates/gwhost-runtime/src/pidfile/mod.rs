//! PID file management for the gateway child.
//!
//! The supervisor records the child's pid and port in `<state>/gateway.pid`
//! so a gateway orphaned by a crashed host can be reaped on the next start.
//!
//! # Safety guarantees
//! - Atomic writes via temp file + rename
//! - Process verification before killing: executable and start time must
//!   both match, so a recycled PID is never signalled
//! - Conservative cleanup (if verification fails, only delete the PID file)

mod io;
mod sweep;
mod verify;

pub use io::{PidFileData, delete_pidfile, read_pidfile, write_pidfile};
pub use sweep::{SweepOutcome, reap_stale_gateway};
pub use verify::{is_gateway_process, pid_exists, process_start_time};
