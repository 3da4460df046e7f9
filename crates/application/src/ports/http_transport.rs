//! HTTP transport port

use async_trait::async_trait;
use thiserror::Error;

use portal_domain::{RequestEnvelope, ResponseEnvelope};

/// Errors raised before a response could be obtained.
///
/// Any response that made it back, whatever its status, is not an error at
/// this level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete within the timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// DNS resolution failed.
    #[error("could not resolve {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying error message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection failed for another reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Too many redirects were followed.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// The request or response body could not be handled.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns true if the request timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Port for sending requests to the portal backend.
///
/// Implementations resolve the envelope's path against the configured base
/// URL and send its headers and body unchanged.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns whatever response the server produced.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was obtained.
    async fn send(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope, TransportError>;
}
