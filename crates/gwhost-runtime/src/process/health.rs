//! TCP readiness probing for the gateway.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

/// Timing for a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Hard budget for the whole wait.
    pub timeout: Duration,
    /// Delay between failed probes.
    pub interval: Duration,
    /// Budget for one connect attempt.
    pub probe_timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(250),
            probe_timeout: Duration::from_millis(500),
        }
    }
}

/// Single connect attempt against `host:port`.
pub async fn probe_tcp(host: &str, port: u16, probe_timeout: Duration) -> bool {
    matches!(
        timeout(probe_timeout, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

/// Poll `host:port` until a connection succeeds or the policy's timeout
/// elapses.
///
/// Never blocks past the overall deadline: each probe and each sleep is
/// clipped to the time remaining.
pub async fn wait_for_tcp_ready(host: &str, port: u16, policy: ReadinessPolicy) -> bool {
    info!("Waiting for gateway to accept connections on {host}:{port}");
    let deadline = Instant::now() + policy.timeout;
    let mut attempt: u32 = 0;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            debug!(port = %port, attempts = %attempt, "Readiness wait timed out");
            return false;
        }
        attempt += 1;

        if probe_tcp(host, port, policy.probe_timeout.min(remaining)).await {
            info!(port = %port, attempts = %attempt, "Gateway is accepting connections");
            return true;
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            debug!(port = %port, attempts = %attempt, "Readiness wait timed out");
            return false;
        }
        debug!(port = %port, attempt = %attempt, "Gateway not ready yet, retrying");
        sleep(policy.interval.min(remaining)).await;
    }
}
