//! Token store implementation
//!
//! Holds at most one token for the lifetime of the store. All remote
//! fetches go through a single async lock, so concurrent cache misses and
//! concurrent refreshes after an auth failure collapse into one request.

use crate::transport::HttpTransport;
use crate::BlocketError;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Token endpoint payload
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    #[serde(rename = "bearerToken")]
    bearer_token: Option<String>,
}

/// An opaque bearer token
#[derive(Clone)]
pub struct Token {
    value: Arc<str>,
    fetched_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// When this token was fetched
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    /// Whether both handles come from the same fetch
    ///
    /// Two fetches returning the same string are still different issues.
    pub fn same_issue(&self, other: &Token) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

/// Process-wide holder of the current bearer token
pub struct TokenStore {
    http: Arc<dyn HttpTransport>,
    endpoint: String,
    headers: HeaderMap,
    /// Current token (sync lock, never held across an await)
    cached: RwLock<Option<Token>>,
    /// Serializes remote fetches
    fetch_lock: Mutex<()>,
}

impl TokenStore {
    /// Creates an empty token store
    ///
    /// # Arguments
    ///
    /// * `http` - Transport used to call the token endpoint
    /// * `endpoint` - URL of the token endpoint
    /// * `headers` - Protocol headers sent with token requests
    pub fn new(http: Arc<dyn HttpTransport>, endpoint: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            headers,
            cached: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Returns the cached token without ever fetching
    pub fn peek(&self) -> Option<Token> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the cached token, fetching one on a cache miss
    pub async fn get(&self) -> Result<Token, BlocketError> {
        if let Some(token) = self.peek() {
            return Ok(token);
        }

        let _fetch_guard = self.fetch_lock.lock().await;

        // Another caller may have fetched while we waited
        if let Some(token) = self.peek() {
            return Ok(token);
        }

        self.fetch_and_store().await
    }

    /// Fetches a new token regardless of the cache state
    pub async fn refresh(&self) -> Result<Token, BlocketError> {
        let _fetch_guard = self.fetch_lock.lock().await;
        self.fetch_and_store().await
    }

    /// Replaces `seen` after the server rejected it
    ///
    /// If the cache already holds a different token, a concurrent caller
    /// refreshed first and that token is returned without another fetch.
    pub async fn refresh_stale(&self, seen: &Token) -> Result<Token, BlocketError> {
        let _fetch_guard = self.fetch_lock.lock().await;

        if let Some(current) = self.peek() {
            if !current.same_issue(seen) {
                tracing::debug!("Token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        self.fetch_and_store().await
    }

    /// Drops the cached token; the next `get` fetches a new one
    pub fn invalidate(&self) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Calls the token endpoint and caches the result. Caller holds `fetch_lock`.
    async fn fetch_and_store(&self) -> Result<Token, BlocketError> {
        tracing::debug!("Fetching new API token from {}", self.endpoint);

        let payload = self
            .http
            .get_json(&self.endpoint, &[], self.headers.clone())
            .await
            .map_err(|e| BlocketError::AuthFetch(format!("token endpoint request failed: {}", e)))?;

        let response: AccessTokenResponse = serde_json::from_value(payload)
            .map_err(|e| BlocketError::AuthFetch(format!("unexpected token payload: {}", e)))?;

        let value = response
            .bearer_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BlocketError::AuthFetch("response has no bearerToken".to_string()))?;

        let token = Token::new(value);
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        Ok(token)
    }
}
