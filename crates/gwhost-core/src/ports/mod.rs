//! Port definitions for adapters outside the core.
//!
//! The UI collaborator reaches the host only through these traits plus the
//! state broadcast; implementations live in `gwhost-runtime`.

mod host_control;

pub use host_control::{ControlError, HostControl};
