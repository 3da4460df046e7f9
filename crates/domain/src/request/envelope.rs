//! Outbound request envelope.

use serde::Serialize;

use super::header::{AUTHORIZATION, CONTENT_TYPE, Headers};
use super::method::HttpMethod;
use crate::error::{DomainError, DomainResult};

/// Default content type for request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A request against the portal backend.
///
/// The envelope is built once and then only read. Attaching a credential
/// produces a new envelope with the same method, path and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    method: HttpMethod,
    path: String,
    headers: Headers,
    body: Option<String>,
}

impl RequestEnvelope {
    /// Creates a bodiless request for `path`, relative to the backend base URL.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Shorthand for a `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Creates a request whose body is `value` serialised as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(
        method: HttpMethod,
        path: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(value)?;
        Ok(Self::new(method, path).with_body(body))
    }

    /// Returns this envelope with the given raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns this envelope with an extra header, replacing any header of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Returns a copy of this envelope carrying `Authorization: Bearer <token>`.
    #[must_use]
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut next = self.clone();
        next.headers.set(AUTHORIZATION, format!("Bearer {token}"));
        next
    }

    /// Returns a copy with `Content-Type: application/json` unless a content
    /// type was already chosen by the caller.
    #[must_use]
    pub fn with_default_content_type(&self) -> Self {
        let mut next = self.clone();
        if !next.headers.contains(CONTENT_TYPE) {
            next.headers.set(CONTENT_TYPE, JSON_CONTENT_TYPE);
        }
        next
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the path relative to the backend base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the bearer token currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Checks that the path is relative to the base URL and that every
    /// header name is a valid token.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPath`] if the path does not start with
    /// `/`, or [`DomainError::InvalidHeaderName`] for the first bad name.
    pub fn validate(&self) -> DomainResult<()> {
        if !self.path.starts_with('/') {
            return Err(DomainError::InvalidPath(self.path.clone()));
        }
        if let Some(header) = self.headers.iter().find(|h| !is_token(&h.name)) {
            return Err(DomainError::InvalidHeaderName(header.name.clone()));
        }
        Ok(())
    }
}

/// RFC 9110 token: visible ASCII without separators.
fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
