//! Startup-fatal gateway errors.
//!
//! Every variant is converted into a `GatewayState::Failed` by the
//! supervisor; none escapes the supervisor boundary.

use thiserror::Error;

/// Reasons a supervised run cannot reach `Ready`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Neither the preferred port nor an OS-assigned one could be bound.
    #[error("No loopback port available (preferred {preferred}): {reason}")]
    PortResolution { preferred: u16, reason: String },

    /// The gateway executable could not be started.
    #[error("Failed to spawn gateway `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    /// The gateway ran but never accepted a connection in time.
    #[error("Gateway did not open port {port} within {timeout_ms}ms")]
    ReadinessTimeout { port: u16, timeout_ms: u128 },

    /// The gateway exited before accepting a connection.
    #[error("Gateway exited before opening port {port} ({status})")]
    ExitedBeforeReady { port: u16, status: String },

    /// State directory, token or config could not be prepared.
    #[error("Failed to prepare gateway state: {0}")]
    Bootstrap(String),
}

impl GatewayError {
    /// Whether the child process ever ran (its stderr tail is meaningful).
    pub const fn child_ran(&self) -> bool {
        matches!(
            self,
            Self::ReadinessTimeout { .. } | Self::ExitedBeforeReady { .. }
        )
    }
}
