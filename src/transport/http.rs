//! reqwest-backed HTTP transport
//!
//! This module handles the raw HTTP requests of the client, including:
//! - Building the HTTP client with timeouts and compression
//! - Converting configured header tables into header maps
//! - Status classification and JSON decoding of responses

use crate::config::ClientConfig;
use crate::transport::{HttpTransport, TransportError};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The client configuration (timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    let user_agent = concat!("blocket-client/", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Converts a configured header table into a header map
pub fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ConfigError::Validation(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ConfigError::Validation(format!("Invalid value for header '{}': {}", name, e))
        })?;
        map.insert(name, value);
    }

    Ok(map)
}

/// Production transport issuing requests with reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a transport with a client built from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: HeaderMap,
    ) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            // Error bodies are decoded best-effort; some carry a provider status code
            let body = response
                .text()
                .await
                .ok()
                .and_then(|text| serde_json::from_str::<Value>(&text).ok());
            return Err(TransportError::http(
                status.as_u16(),
                body,
                status.canonical_reason(),
            ));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| TransportError::decode(e.to_string()))
    }
}
