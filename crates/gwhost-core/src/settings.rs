//! Supervisor settings and validation.
//!
//! Pure value types with defaults; adapters (CLI flags, env vars) fill them in.

use std::net::Ipv4Addr;
use std::time::Duration;

/// Port the gateway prefers when it is free.
pub const DEFAULT_GATEWAY_PORT: u16 = 18789;

/// Loopback host the gateway binds to and readiness probes target.
pub const DEFAULT_GATEWAY_HOST: &str = "127.0.0.1";

/// Characters of stderr retained for failure diagnostics.
pub const DEFAULT_TAIL_BUDGET: usize = 24_000;

/// Tunables for one supervised gateway run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Port tried first; 0 always asks the OS for a free port.
    pub preferred_port: u16,
    /// Host used for readiness probes and the published URL. Must be
    /// `localhost` or an IPv4 loopback address, matching where ports are
    /// probed for availability.
    pub host: String,
    /// Overall budget for the gateway to open its port.
    pub readiness_timeout: Duration,
    /// Delay between readiness probes.
    pub poll_interval: Duration,
    /// Budget for a single connect attempt.
    pub probe_timeout: Duration,
    /// Wait between SIGTERM and SIGKILL on terminate.
    pub termination_grace: Duration,
    /// Stderr tail size in characters.
    pub tail_budget: usize,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            preferred_port: DEFAULT_GATEWAY_PORT,
            host: DEFAULT_GATEWAY_HOST.to_string(),
            readiness_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            probe_timeout: Duration::from_millis(500),
            termination_grace: Duration::from_millis(1500),
            tail_budget: DEFAULT_TAIL_BUDGET,
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Port should be >= 1024 (privileged ports require root) or 0 for any, got {0}")]
    InvalidPort(u16),

    #[error("Host cannot be empty")]
    EmptyHost,

    #[error("Host must be localhost or an IPv4 loopback address, got {0}")]
    NonLoopbackHost(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Probe timeout ({probe_ms}ms) exceeds readiness timeout ({ready_ms}ms)")]
    ProbeExceedsReadiness { probe_ms: u128, ready_ms: u128 },

    #[error("Tail budget must be greater than zero")]
    ZeroTailBudget,
}

/// Validate settings values.
pub fn validate_settings(settings: &SupervisorSettings) -> Result<(), SettingsError> {
    if settings.preferred_port != 0 && settings.preferred_port < 1024 {
        return Err(SettingsError::InvalidPort(settings.preferred_port));
    }

    let host = settings.host.trim();
    if host.is_empty() {
        return Err(SettingsError::EmptyHost);
    }
    if !is_loopback_host(host) {
        return Err(SettingsError::NonLoopbackHost(host.to_string()));
    }

    for (name, value) in [
        ("Readiness timeout", settings.readiness_timeout),
        ("Poll interval", settings.poll_interval),
        ("Probe timeout", settings.probe_timeout),
        ("Termination grace", settings.termination_grace),
    ] {
        if value.is_zero() {
            return Err(SettingsError::ZeroDuration(name));
        }
    }

    if settings.probe_timeout > settings.readiness_timeout {
        return Err(SettingsError::ProbeExceedsReadiness {
            probe_ms: settings.probe_timeout.as_millis(),
            ready_ms: settings.readiness_timeout.as_millis(),
        });
    }

    if settings.tail_budget == 0 {
        return Err(SettingsError::ZeroTailBudget);
    }

    Ok(())
}

fn is_loopback_host(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<Ipv4Addr>().is_ok_and(|ip| ip.is_loopback())
}
