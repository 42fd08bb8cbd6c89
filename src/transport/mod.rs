//! Transport layer for API requests
//!
//! This module contains everything between the engine and the network:
//! - `HttpTransport`: the "decode JSON over HTTP" boundary
//! - `ReqwestTransport`: the production implementation on top of reqwest
//! - `AuthenticatedTransport`: bearer-token injection and the bounded
//!   refresh-and-retry cycle on authentication failures

mod authenticated;
mod http;

pub use authenticated::AuthenticatedTransport;
pub use http::{build_header_map, build_http_client, ReqwestTransport};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;

/// HTTP status code signalling an invalid or expired token
pub const UNAUTHORIZED: u16 = 401;

/// HTTP status code for a missing resource
pub const NOT_FOUND: u16 = 404;

/// A failed HTTP exchange
///
/// Carries the status code when the server answered, and the decoded error
/// body when the answer was JSON.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status code, if a response was received
    pub status: Option<u16>,
    /// Decoded JSON error body, if any
    pub body: Option<Value>,
    /// Human readable description
    pub message: String,
}

impl TransportError {
    /// An error response from the server
    pub fn http(status: u16, body: Option<Value>, reason: Option<&str>) -> Self {
        Self {
            status: Some(status),
            body,
            message: format!("HTTP {}: {}", status, reason.unwrap_or("Request failed")),
        }
    }

    /// A failure before any response was received
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// A response that could not be decoded as JSON
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            message: format!("Failed to decode response: {}", message.into()),
        }
    }

    /// Whether this failure means the bearer token was rejected
    ///
    /// The provider signals this either with a 401 status or with a
    /// `status_code` of 401 inside the error payload.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(UNAUTHORIZED)
            || self
                .body
                .as_ref()
                .and_then(|body| body.get("status_code"))
                .and_then(Value::as_u64)
                == Some(u64::from(UNAUTHORIZED))
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(NOT_FOUND)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network("Request timeout")
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            Self::network(e.to_string())
        }
    }
}

/// Generic JSON-over-HTTP GET
///
/// Implementations perform exactly one request per call and never retry;
/// retry policy lives in [`AuthenticatedTransport`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues a GET to `url` with the given query parameters and headers
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The decoded JSON body of a 2xx response
    /// * `Err(TransportError)` - A non-2xx status, network or decode failure
    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: HeaderMap,
    ) -> Result<Value, TransportError>;
}
