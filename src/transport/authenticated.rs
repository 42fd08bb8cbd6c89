//! Authenticated requests with transparent token renewal
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | 2xx | Return the decoded payload |
//! | HTTP 401 or payload `status_code` 401, attempts left | Refresh token, retry |
//! | HTTP 401 or payload `status_code` 401, no attempts left | Surface the original error |
//! | Any other failure | Surface immediately |

use crate::auth::{Token, TokenStore};
use crate::transport::HttpTransport;
use crate::BlocketError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::sync::Arc;

/// Wraps single API calls with the current bearer token
pub struct AuthenticatedTransport {
    http: Arc<dyn HttpTransport>,
    tokens: Arc<TokenStore>,
    default_headers: HeaderMap,
    retry_attempts: u32,
}

impl AuthenticatedTransport {
    /// Creates a new authenticated transport
    ///
    /// # Arguments
    ///
    /// * `http` - The underlying HTTP transport
    /// * `tokens` - Token store shared with every other user of the API
    /// * `default_headers` - Protocol headers sent with every request
    /// * `retry_attempts` - Maximum token refreshes per request
    pub fn new(
        http: Arc<dyn HttpTransport>,
        tokens: Arc<TokenStore>,
        default_headers: HeaderMap,
        retry_attempts: u32,
    ) -> Self {
        Self {
            http,
            tokens,
            default_headers,
            retry_attempts,
        }
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Executes a GET with the default protocol headers
    pub async fn execute(&self, url: &str, params: &[(String, String)]) -> Result<Value, BlocketError> {
        self.execute_with_headers(url, params, &HeaderMap::new())
            .await
    }

    /// Executes a GET, overriding default headers with `overrides`
    ///
    /// The request is attempted at most `retry_attempts + 1` times. Only
    /// authentication failures are retried, each after a token refresh.
    pub async fn execute_with_headers(
        &self,
        url: &str,
        params: &[(String, String)],
        overrides: &HeaderMap,
    ) -> Result<Value, BlocketError> {
        let mut attempt = 0;

        loop {
            let token = self.tokens.get().await?;
            let headers = self.request_headers(&token, overrides)?;

            let error = match self.http.get_json(url, params, headers).await {
                Ok(payload) => return Ok(payload),
                Err(e) => e,
            };

            if error.status.is_some() {
                tracing::error!("{} ({})", error, url);
            } else {
                tracing::error!("Request to {} failed: {}", url, error);
            }

            if !error.is_unauthorized() || attempt >= self.retry_attempts {
                return Err(error.into());
            }

            attempt += 1;
            tracing::info!(
                "Token expired. Retrying request ({}/{})",
                attempt,
                self.retry_attempts
            );
            self.tokens.refresh_stale(&token).await?;
        }
    }

    /// Merges default headers, per-call overrides, and the bearer credential
    fn request_headers(&self, token: &Token, overrides: &HeaderMap) -> Result<HeaderMap, BlocketError> {
        let mut headers = self.default_headers.clone();
        for (name, value) in overrides {
            headers.insert(name.clone(), value.clone());
        }

        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|_| BlocketError::AuthFetch("token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        Ok(headers)
    }
}
