//! Blocket client: authenticated, paginating ad retrieval
//!
//! This crate fetches classified-ad listings from the Blocket search API,
//! handling bearer-token acquisition, transparent re-authentication when a
//! token expires mid-session, and aggregation of multi-page result sets
//! across the response envelopes used by different API revisions.

pub mod auth;
pub mod client;
pub mod config;
pub mod pagination;
pub mod query;
pub mod response;
pub mod transport;

use thiserror::Error;

/// Main error type for Blocket client operations
#[derive(Debug, Error)]
pub enum BlocketError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Failed to retrieve API token: {0}")]
    AuthFetch(String),

    #[error("Malformed response for page {page}: {reason}")]
    MalformedResponse { page: u32, reason: String },

    #[error(transparent)]
    Transport(#[from] transport::TransportError),

    #[error("Request for page {page} failed: {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<BlocketError>,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl BlocketError {
    /// Returns the transport error at the root of this error, if any
    pub fn transport_error(&self) -> Option<&transport::TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Page { source, .. } => source.transport_error(),
            _ => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Blocket client operations
pub type Result<T> = std::result::Result<T, BlocketError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use auth::{Token, TokenStore};
pub use client::BlocketClient;
pub use config::{ClientConfig, LogLevel, LookupStrategy};
pub use pagination::{PageStrategy, PaginationAggregator};
pub use query::{ListingType, QueryConfig, Status};
pub use response::{Ad, BlocketAd, NormalizedPage, ResponseShape};
pub use transport::{AuthenticatedTransport, HttpTransport, ReqwestTransport, TransportError};
