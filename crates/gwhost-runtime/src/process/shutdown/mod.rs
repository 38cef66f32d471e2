//! Graceful process shutdown for the gateway.
//!
//! - `shutdown_child`: for a running process we own (includes reaping)
//! - `kill_pid`: for a stale gateway left behind by a crashed host

mod child;
mod pid;

pub use child::{DEFAULT_TERMINATION_GRACE, shutdown_child};
pub use pid::kill_pid;
