//! obs-websocket client error types.

use std::time::Duration;

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, ObsError>;

/// Errors that can occur while talking to obs-websocket.
#[derive(Error, Debug)]
pub enum ObsError {
    /// Transport failures: connect refused, socket reset, server close.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A handshake or request did not complete in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The server sent something that does not match the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered the request with a failure status.
    #[error("Request {request_type} failed with code {code}: {comment}")]
    Request {
        request_type: String,
        code: u16,
        comment: String,
    },

    /// Encoding an outgoing message failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ObsError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Whether the error means the session is no longer usable.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ObsError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_classification() {
        assert!(ObsError::connection("reset").is_connection());
        assert!(ObsError::Timeout(Duration::from_secs(3)).is_connection());
        assert!(!ObsError::protocol("missing key").is_connection());
        assert!(
            !ObsError::Request {
                request_type: "GetStats".to_string(),
                code: 204,
                comment: String::new(),
            }
            .is_connection()
        );
    }
}
