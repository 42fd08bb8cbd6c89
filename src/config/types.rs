use crate::pagination::PageStrategy;
use crate::query::{ListingType, Status};
use crate::response::ResponseShape;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default base URL of the search API
pub const DEFAULT_API_BASE_URL: &str = "https://api.blocket.se/search_bff/v2/content";

/// Default endpoint handing out bearer tokens
pub const DEFAULT_TOKEN_ENDPOINT: &str =
    "https://www.blocket.se/api/adout-api-route/refresh-token-and-validate-session";

/// Main configuration structure for the Blocket client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Base URL for search requests and single-ad lookups
    pub api_base_url: String,

    /// URL of the token endpoint
    pub token_endpoint: String,

    /// Maximum number of token refreshes per request on an auth failure
    pub retry_attempts: u32,

    /// Verbosity of the client's logging
    pub log_level: LogLevel,

    /// Envelope the search endpoint answers with
    pub response_shape: ResponseShape,

    /// How pages after the first are fetched
    pub page_strategy: PageStrategyKind,

    /// Cap on in-flight page requests when fetching concurrently (unset = no cap)
    pub max_concurrent_pages: Option<usize>,

    /// How `find_by_id` locates a single ad
    pub lookup_strategy: LookupStrategy,

    /// Page size used when scanning search results for an ad id
    pub scan_page_size: u32,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Protocol headers sent with every request
    ///
    /// A `[headers]` table is layered over `default_headers()`; entries
    /// replace defaults with the same name (case-insensitively).
    #[serde(deserialize_with = "deserialize_headers")]
    pub headers: BTreeMap<String, String>,

    /// Values merged into every query that does not set them
    pub query_defaults: QueryDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            retry_attempts: 3,
            log_level: LogLevel::Error,
            response_shape: ResponseShape::Auto,
            page_strategy: PageStrategyKind::Sequential,
            max_concurrent_pages: None,
            lookup_strategy: LookupStrategy::Direct,
            scan_page_size: 100,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            headers: default_headers(),
            query_defaults: QueryDefaults::default(),
        }
    }
}

impl ClientConfig {
    /// Resolves the configured pagination strategy
    pub fn page_strategy(&self) -> PageStrategy {
        match self.page_strategy {
            PageStrategyKind::Sequential => PageStrategy::Sequential,
            PageStrategyKind::Concurrent => PageStrategy::Concurrent {
                max_in_flight: self.max_concurrent_pages.and_then(NonZeroUsize::new),
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Protocol headers the Blocket web client sends
///
/// `Accept-Encoding` is left to the HTTP client so that it only advertises
/// encodings it can actually decode.
pub fn default_headers() -> BTreeMap<String, String> {
    [
        ("Accept", "application/json"),
        ("Accept-Language", "sv-SE,sv;q=0.9,en;q=0.8"),
        ("Connection", "keep-alive"),
        ("Referer", "https://www.blocket.se/"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Merges `overrides` over `base`, treating header names case-insensitively
fn merge_headers(
    mut base: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    for (name, value) in overrides {
        base.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        base.insert(name, value);
    }
    base
}

fn deserialize_headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let configured = BTreeMap::<String, String>::deserialize(deserializer)?;
    Ok(merge_headers(default_headers(), configured))
}

/// Logging verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Error,
    Info,
    Debug,
}

impl LogLevel {
    /// Returns the `tracing` filter directive for this level
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::None => "off",
            Self::Error => "error",
            Self::Info => "blocket_client=info,blocket=info,warn",
            Self::Debug => "blocket_client=debug,blocket=debug,info",
        }
    }
}

/// Pagination strategy as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStrategyKind {
    Sequential,
    Concurrent,
}

/// How a single ad is looked up by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupStrategy {
    /// `GET {api-base-url}/{id}`
    Direct,
    /// Search for the id and scan the results for an exact identifier match
    SearchScan,
}

/// Defaults merged into user queries
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct QueryDefaults {
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub listing_type: Option<ListingType>,
    pub status: Option<Status>,
    pub geolocation: Option<u32>,
    pub include: Option<String>,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            limit: Some(100),
            sort: Some("rel".to_string()),
            listing_type: Some(ListingType::Selling),
            status: Some(Status::Active),
            geolocation: Some(3),
            include: Some("extend_with_shipping".to_string()),
        }
    }
}
