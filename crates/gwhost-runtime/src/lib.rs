//! Process runtime for the gwhost gateway supervisor.
//!
//! Everything here touches the OS: child processes, sockets, signals, PID
//! files and the platform opener. Domain types live in `gwhost-core`.

#![deny(unsafe_code)]

pub mod control;
pub mod gateway;
pub mod pidfile;
pub mod process;

pub use control::{DesktopHostControl, validate_external_url};
pub use gateway::{
    GatewayCommand, GatewaySupervisor, StateBroadcaster, StateSubscription, SupervisorError,
};
pub use process::{TailBuffer, pick_port, wait_for_tcp_ready};
