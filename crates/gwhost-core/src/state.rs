//! Gateway lifecycle state broadcast to the UI layer.
//!
//! Exactly one state is current per supervised run. The only legal
//! transitions are none → `Starting`, `Starting` → `Ready` and
//! `Starting` → `Failed`; a new run starts from a fresh supervisor.

use std::fmt;
use std::net::Ipv6Addr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the supervised gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GatewayState {
    /// Spawn issued, port not yet confirmed open.
    Starting {
        port: u16,
        logs_dir: PathBuf,
        token: String,
    },

    /// Port confirmed open within the readiness timeout.
    Ready {
        port: u16,
        logs_dir: PathBuf,
        url: String,
        token: String,
    },

    /// Startup failed; `details` is meant for a human to self-serve.
    Failed {
        port: u16,
        logs_dir: PathBuf,
        details: String,
        token: String,
    },
}

impl GatewayState {
    /// Create a starting state.
    pub fn starting(port: u16, logs_dir: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self::Starting {
            port,
            logs_dir: logs_dir.into(),
            token: token.into(),
        }
    }

    /// Create a ready state; the URL is derived from host and port.
    pub fn ready(
        host: &str,
        port: u16,
        logs_dir: impl Into<PathBuf>,
        token: impl Into<String>,
    ) -> Self {
        Self::Ready {
            port,
            logs_dir: logs_dir.into(),
            url: gateway_url(host, port),
            token: token.into(),
        }
    }

    /// Create a failed state.
    pub fn failed(
        port: u16,
        logs_dir: impl Into<PathBuf>,
        details: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self::Failed {
            port,
            logs_dir: logs_dir.into(),
            details: details.into(),
            token: token.into(),
        }
    }

    /// Port the gateway was (or would have been) started on.
    pub const fn port(&self) -> u16 {
        match self {
            Self::Starting { port, .. } | Self::Ready { port, .. } | Self::Failed { port, .. } => {
                *port
            }
        }
    }

    /// Token shared by every state of a run.
    pub fn token(&self) -> &str {
        match self {
            Self::Starting { token, .. }
            | Self::Ready { token, .. }
            | Self::Failed { token, .. } => token,
        }
    }

    /// Logs directory of the run.
    pub fn logs_dir(&self) -> &PathBuf {
        match self {
            Self::Starting { logs_dir, .. }
            | Self::Ready { logs_dir, .. }
            | Self::Failed { logs_dir, .. } => logs_dir,
        }
    }

    /// `true` for `Ready` and `Failed`.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Starting { .. })
    }

    /// Short lowercase phase name.
    pub const fn phase(&self) -> &'static str {
        match self {
            Self::Starting { .. } => "starting",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether `self` may directly follow `previous`.
    pub const fn can_follow(&self, previous: Option<&Self>) -> bool {
        matches!(
            (previous, self),
            (None, Self::Starting { .. })
                | (Some(Self::Starting { .. }), Self::Ready { .. } | Self::Failed { .. })
        )
    }
}

impl fmt::Display for GatewayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting { port, .. } => write!(f, "Starting on port {port}"),
            Self::Ready { url, .. } => write!(f, "Ready at {url}"),
            Self::Failed { port, .. } => write!(f, "Failed (port {port})"),
        }
    }
}

/// Base URL of a gateway listening on `host:port`.
///
/// IPv6 literals are bracketed.
pub fn gateway_url(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("http://[{host}]:{port}/")
    } else {
        format!("http://{host}:{port}/")
    }
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("Illegal gateway state transition from {from} to {to}")]
    IllegalTransition { from: &'static str, to: &'static str },
}
