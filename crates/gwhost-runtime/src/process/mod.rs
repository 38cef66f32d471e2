//! Child process plumbing for the gateway.
//!
//! # Structure
//!
//! - `spawn_process` / `SupervisedProcess` - launch and own the child
//! - `spawn_log_pump` / `TailBuffer` - stream output to log files and keep a stderr tail
//! - `pick_port` - loopback port allocation
//! - `wait_for_tcp_ready` - readiness probing
//! - `shutdown` - SIGTERM → SIGKILL escalation

mod health;
mod ports;
pub mod shutdown;
mod spawn;
mod stream;
mod tail;

pub use health::{ReadinessPolicy, probe_tcp, wait_for_tcp_ready};
pub use ports::pick_port;
pub use shutdown::{DEFAULT_TERMINATION_GRACE, kill_pid, shutdown_child};
pub use spawn::{ExitPoll, ProcessSpec, SupervisedProcess, describe_exit, spawn_process};
pub use tail::TailBuffer;
