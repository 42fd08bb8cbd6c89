//! Public entry points
//!
//! `BlocketClient` wires the token store, authenticated transport and page
//! aggregator together and exposes the two retrieval operations:
//! - `find`: all ads matching a query, across every page
//! - `find_by_id`: a single ad, by direct lookup or by search-and-scan

use crate::auth::TokenStore;
use crate::config::{ClientConfig, LookupStrategy};
use crate::pagination::{PageStrategy, PaginationAggregator};
use crate::query::QueryConfig;
use crate::response::Ad;
use crate::transport::{build_header_map, AuthenticatedTransport, HttpTransport, ReqwestTransport};
use crate::BlocketError;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Client for the Blocket search API
pub struct BlocketClient {
    config: Arc<ClientConfig>,
    tokens: Arc<TokenStore>,
    transport: Arc<AuthenticatedTransport>,
    aggregator: PaginationAggregator,
}

impl BlocketClient {
    /// Creates a client talking HTTP through reqwest
    ///
    /// # Example
    ///
    /// ```no_run
    /// use blocket_client::{BlocketClient, ClientConfig, QueryConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = BlocketClient::new(ClientConfig::default())?;
    /// let ads = client.find(&QueryConfig::new("macbook air").limit(20)).await?;
    /// println!("Found {} ads", ads.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self, BlocketError> {
        let http = ReqwestTransport::from_config(&config)?;
        Self::with_transport(config, Arc::new(http))
    }

    /// Creates a client on top of a custom HTTP transport
    pub fn with_transport(
        config: ClientConfig,
        http: Arc<dyn HttpTransport>,
    ) -> Result<Self, BlocketError> {
        crate::config::validate(&config)?;
        let headers = build_header_map(&config.headers)?;

        let tokens = Arc::new(TokenStore::new(
            Arc::clone(&http),
            config.token_endpoint.clone(),
            headers.clone(),
        ));
        let transport = Arc::new(AuthenticatedTransport::new(
            http,
            Arc::clone(&tokens),
            headers,
            config.retry_attempts,
        ));
        let aggregator = PaginationAggregator::new(
            Arc::clone(&transport),
            config.api_base_url.clone(),
            config.response_shape,
            config.page_strategy(),
        );

        Ok(Self {
            config: Arc::new(config),
            tokens,
            transport,
            aggregator,
        })
    }

    /// Overrides the configured pagination strategy
    pub fn with_page_strategy(mut self, strategy: PageStrategy) -> Self {
        self.aggregator.set_strategy(strategy);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The token store shared by every request of this client
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Finds all ads matching `query`
    ///
    /// Unset query fields are filled from the configured defaults. Every
    /// page of the result is fetched; if any page fails the whole call fails.
    pub async fn find(&self, query: &QueryConfig) -> Result<Vec<Ad>, BlocketError> {
        self.find_with_headers(query, &HeaderMap::new()).await
    }

    /// Like [`find`](Self::find), sending `headers` on every page request
    ///
    /// `headers` override the configured protocol headers for this call only.
    /// The bearer credential is always set by the client.
    pub async fn find_with_headers(
        &self,
        query: &QueryConfig,
        headers: &HeaderMap,
    ) -> Result<Vec<Ad>, BlocketError> {
        query.validate()?;

        let query = query.merged_with(&self.config.query_defaults);
        self.aggregator.fetch_all_with_headers(&query, headers).await
    }

    /// Looks up a single ad by its identifier
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Ad))` - The ad was found
    /// * `Ok(None)` - No ad with this identifier exists
    /// * `Err(BlocketError)` - The id was empty or the lookup failed
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Ad>, BlocketError> {
        self.find_by_id_with_headers(id, &HeaderMap::new()).await
    }

    /// Like [`find_by_id`](Self::find_by_id), overriding protocol headers for this call
    pub async fn find_by_id_with_headers(
        &self,
        id: &str,
        headers: &HeaderMap,
    ) -> Result<Option<Ad>, BlocketError> {
        if id.trim().is_empty() {
            return Err(BlocketError::InvalidQuery("ad id is required".to_string()));
        }

        match self.config.lookup_strategy {
            LookupStrategy::Direct => self.lookup_direct(id, headers).await,
            LookupStrategy::SearchScan => self.lookup_by_search(id, headers).await,
        }
    }

    /// `GET {api_base_url}/{id}`, expecting `{ "data": ad }`
    async fn lookup_direct(&self, id: &str, headers: &HeaderMap) -> Result<Option<Ad>, BlocketError> {
        let url = resource_url(&self.config.api_base_url, id)?;

        let payload = match self.transport.execute_with_headers(&url, &[], headers).await {
            Ok(payload) => payload,
            Err(BlocketError::Transport(e)) if e.is_not_found() => {
                tracing::debug!("Ad {} not found", id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match payload {
            Value::Object(mut fields) => match fields.remove("data") {
                None | Some(Value::Null) => Ok(None),
                Some(ad) => Ok(Some(Ad::new(ad))),
            },
            _ => Ok(None),
        }
    }

    /// Searches for `id` and returns the first ad whose identifier equals it
    async fn lookup_by_search(&self, id: &str, headers: &HeaderMap) -> Result<Option<Ad>, BlocketError> {
        let query = QueryConfig::new(id).limit(self.config.scan_page_size);
        let ads = self.find_with_headers(&query, headers).await?;

        let scanned = ads.len();
        let found = ads.into_iter().find(|ad| ad.has_id(id));
        if found.is_none() {
            tracing::debug!("No exact match for ad {} among {} search results", id, scanned);
        }

        Ok(found)
    }
}

/// Builds the single-resource URL for `id`, percent-encoding it as one path segment
fn resource_url(base: &str, id: &str) -> Result<String, BlocketError> {
    let mut url = Url::parse(base)?;

    url.path_segments_mut()
        .map_err(|_| BlocketError::InvalidQuery(format!("cannot append a path to '{}'", base)))?
        .pop_if_empty()
        .push(id);

    Ok(url.to_string())
}
