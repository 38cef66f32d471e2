//! Port allocation for the gateway.

use std::net::Ipv4Addr;

use gwhost_core::GatewayError;
use tokio::net::TcpListener;
use tracing::debug;

/// Pick the gateway port: `preferred` if it is free on loopback, otherwise
/// an OS-assigned free port.
///
/// The probe listener is dropped before returning, so the port is free but
/// not reserved; another process may still race for it.
pub async fn pick_port(preferred: u16) -> Result<u16, GatewayError> {
    if preferred != 0 {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, preferred)).await {
            Ok(listener) => {
                drop(listener);
                debug!(port = %preferred, "Preferred gateway port is free");
                return Ok(preferred);
            }
            Err(e) => {
                debug!(port = %preferred, error = %e, "Preferred port unavailable, asking OS");
            }
        }
    }

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .map_err(|e| GatewayError::PortResolution {
            preferred,
            reason: e.to_string(),
        })?;
    let port = listener
        .local_addr()
        .map_err(|e| GatewayError::PortResolution {
            preferred,
            reason: e.to_string(),
        })?
        .port();
    drop(listener);

    debug!(port = %port, preferred = %preferred, "Allocated OS-assigned gateway port");
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn free_port() -> u16 {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn returns_preferred_when_free() {
        let port = free_port().await;
        assert_eq!(pick_port(port).await.unwrap(), port);
    }

    #[tokio::test]
    async fn falls_back_when_preferred_is_taken() {
        let holder = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let taken = holder.local_addr().unwrap().port();

        let picked = pick_port(taken).await.unwrap();
        assert_ne!(picked, taken);
        assert_ne!(picked, 0);
        assert!(TcpListener::bind((Ipv4Addr::LOCALHOST, picked)).await.is_ok());
    }

    #[tokio::test]
    async fn zero_means_any_port() {
        assert_ne!(pick_port(0).await.unwrap(), 0);
    }
}
