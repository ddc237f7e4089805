//! Application-wide error types.

use obs_websocket::ObsError;
use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream unreachable, reset or timed out. Recovered by reconnecting.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Upstream answered with something the exporter cannot use.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("A metric producer is already registered")]
    DuplicateProducer,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<ObsError> for Error {
    fn from(err: ObsError) -> Self {
        if err.is_connection() {
            Self::Connection(err.to_string())
        } else {
            Self::Protocol(err.to_string())
        }
    }
}
