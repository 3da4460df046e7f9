//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port using the reqwest library.
//! It resolves envelope paths against the configured base URL and sends
//! headers and body exactly as the envelope carries them.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::trace;

use portal_application::ports::{HttpTransport, TransportError};
use portal_domain::request::{Header, Headers, HttpMethod};
use portal_domain::{ClientSettings, RequestEnvelope, ResponseEnvelope};

/// Redirects followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// HTTP transport implementation using reqwest.
///
/// Wraps a `reqwest::Client` configured from [`ClientSettings`]. The
/// transport never interprets status codes; that is the authenticated
/// client's job.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    settings: ClientSettings,
}

impl ReqwestTransport {
    /// Creates a transport for the backend described by `settings`.
    ///
    /// Configuration:
    /// - Request timeout: `settings.timeout_ms`
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: `settings.user_agent`
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client, settings })
    }

    /// Returns the settings this transport was built with.
    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_ms: self.settings.timeout_ms,
            };
        }

        let host = || {
            error
                .url()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string())
        };

        if error.is_connect() {
            let message = error.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return TransportError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lowered.contains("refused") {
                return TransportError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(reqwest::Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return TransportError::TooManyRedirects { max: MAX_REDIRECTS };
        }

        if error.is_body() || error.is_decode() {
            return TransportError::InvalidBody(error.to_string());
        }

        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope, TransportError> {
        let url = self
            .settings
            .endpoint_url(request.path())
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method()), url);
        for header in request.headers() {
            builder = builder.header(&header.name, &header.value);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status().as_u16();

        let headers: Headers = response
            .headers()
            .iter()
            .map(|(k, v)| Header::new(k.as_str(), v.to_str().unwrap_or("<binary>")))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_error(&e))?
            .to_vec();

        let duration = start.elapsed();
        trace!(method = %request.method(), path = request.path(), status, ?duration, "response received");

        Ok(ResponseEnvelope::new(status, headers, body, duration))
    }
}
