//! Failures that end a relay session.

use super::pump::Direction;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Transport, DNS or TLS failure before the upgrade completed.
    #[error("Failed to connect to the realtime API: {0}")]
    UpstreamConnect(String),
    /// The provider answered the upgrade with a non-101 status.
    #[error("Realtime API rejected the connection: HTTP {status}")]
    UpstreamHandshake { status: u16 },
    #[error("Timed out connecting to the realtime API after {0:?}")]
    UpstreamTimeout(Duration),
    #[error("Failed to send session configuration: {0}")]
    Configure(String),
    #[error("Failed to read {direction} frame: {reason}")]
    Receive {
        direction: Direction,
        reason: String,
    },
    #[error("Failed to forward {direction} frame: {reason}")]
    Forward {
        direction: Direction,
        reason: String,
    },
    #[error("Session idle for {0:?}")]
    IdleTimeout(Duration),
}

impl RelayError {
    /// True when the failure was the downstream client itself, so nothing can be
    /// reported to it.
    pub fn is_downstream_gone(&self) -> bool {
        matches!(
            self,
            RelayError::Receive {
                direction: Direction::ClientToUpstream,
                ..
            } | RelayError::Forward {
                direction: Direction::UpstreamToClient,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_error_message_ends_with_status() {
        let err = RelayError::UpstreamHandshake { status: 401 };
        assert_eq!(
            err.to_string(),
            "Realtime API rejected the connection: HTTP 401"
        );
    }

    #[test]
    fn test_downstream_gone_classification() {
        let client_read = RelayError::Receive {
            direction: Direction::ClientToUpstream,
            reason: "reset".into(),
        };
        let client_write = RelayError::Forward {
            direction: Direction::UpstreamToClient,
            reason: "closed".into(),
        };
        let upstream_read = RelayError::Receive {
            direction: Direction::UpstreamToClient,
            reason: "reset".into(),
        };
        let upstream_write = RelayError::Forward {
            direction: Direction::ClientToUpstream,
            reason: "closed".into(),
        };

        assert!(client_read.is_downstream_gone());
        assert!(client_write.is_downstream_gone());
        assert!(!upstream_read.is_downstream_gone());
        assert!(!upstream_write.is_downstream_gone());
        assert!(!RelayError::UpstreamHandshake { status: 500 }.is_downstream_gone());
        assert!(!RelayError::IdleTimeout(Duration::from_secs(1)).is_downstream_gone());
    }
}
