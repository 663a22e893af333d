//! # Registry Errors
//!
//! Error classification for calls against the Schema Registry REST API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The endpoint URL or TLS material could not be turned into a client
    #[error("invalid registry endpoint: {0}")]
    InvalidEndpoint(String),

    /// The request never produced an HTTP response (DNS, connect, TLS, timeout)
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The registry answered with a status the operation does not accept
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// A success response whose body did not match the documented shape
    #[error("{operation} returned an unexpected body: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl RegistryError {
    /// HTTP status returned by the registry, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short label for metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::InvalidEndpoint(_) => "invalid_endpoint",
            RegistryError::Transport { .. } => "transport",
            RegistryError::Status { .. } => "status",
            RegistryError::Decode { .. } => "decode",
        }
    }
}
