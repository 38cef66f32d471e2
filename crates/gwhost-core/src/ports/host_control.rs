//! Inbound UI commands besides startup.

use std::path::Path;

use thiserror::Error;

/// Errors from host-control pass-throughs.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The URL could not be parsed as an absolute URL.
    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only web links may be opened.
    #[error("Refusing to open `{0}` scheme; only http and https are allowed")]
    UnsupportedScheme(String),

    /// The platform opener failed.
    #[error("Failed to open {target}: {reason}")]
    Open { target: String, reason: String },

    /// A replacement process could not be started.
    #[error("Failed to relaunch: {0}")]
    Relaunch(String),
}

/// Thin pass-throughs the UI may trigger.
///
/// # Implementations
///
/// - `DesktopHostControl` (runtime) - uses the platform opener
/// - Test doubles in adapter crates
pub trait HostControl: Send + Sync {
    /// Reveal the gateway logs directory, creating it if needed.
    fn open_logs_dir(&self, logs_dir: &Path) -> Result<(), ControlError>;

    /// Open a human-initiated external link in the default browser.
    fn open_external(&self, url: &str) -> Result<(), ControlError>;

    /// Start a fresh copy of the host application.
    ///
    /// On success the caller must shut its supervisor down and exit; retry
    /// is always a full relaunch, never an in-place restart of the child.
    fn relaunch(&self) -> Result<(), ControlError>;
}
