//! Multi-page result aggregation
//!
//! This module fetches every page of a search and concatenates the results:
//! 1. Fetch page 1 and learn the total page count from its envelope
//! 2. Stop there if the result fits on one page
//! 3. Fetch pages `2..=page_count` sequentially or concurrently
//! 4. Concatenate in page order, or fail the whole call if any page failed

use crate::query::{PageRequest, QueryConfig};
use crate::response::{Ad, NormalizedPage, ResponseShape};
use crate::transport::AuthenticatedTransport;
use crate::BlocketError;
use futures::stream::{self, StreamExt};
use reqwest::header::HeaderMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// How pages after the first are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageStrategy {
    /// One page at a time, stopping at the first failure
    #[default]
    Sequential,
    /// All remaining pages without ordering dependency
    Concurrent {
        /// Cap on simultaneous page requests (`None` = all at once)
        max_in_flight: Option<NonZeroUsize>,
    },
}

/// Fetches and concatenates all pages of a search
pub struct PaginationAggregator {
    transport: Arc<AuthenticatedTransport>,
    search_url: String,
    shape: ResponseShape,
    strategy: PageStrategy,
}

impl PaginationAggregator {
    /// Creates a new aggregator
    ///
    /// # Arguments
    ///
    /// * `transport` - Authenticated transport used for every page
    /// * `search_url` - URL of the search endpoint
    /// * `shape` - Envelope the search endpoint answers with
    /// * `strategy` - How pages after the first are fetched
    pub fn new(
        transport: Arc<AuthenticatedTransport>,
        search_url: impl Into<String>,
        shape: ResponseShape,
        strategy: PageStrategy,
    ) -> Self {
        Self {
            transport,
            search_url: search_url.into(),
            shape,
            strategy,
        }
    }

    pub fn strategy(&self) -> PageStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: PageStrategy) {
        self.strategy = strategy;
    }

    /// Fetches every page of `query` with the default headers
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Ad>)` - All ads in page order, then intra-page order
    /// * `Err(BlocketError)` - The query was empty or any page failed;
    ///   no partial result is ever returned
    pub async fn fetch_all(&self, query: &QueryConfig) -> Result<Vec<Ad>, BlocketError> {
        self.fetch_all_with_headers(query, &HeaderMap::new()).await
    }

    /// Fetches every page of `query`, sending `overrides` on each page request
    pub async fn fetch_all_with_headers(
        &self,
        query: &QueryConfig,
        overrides: &HeaderMap,
    ) -> Result<Vec<Ad>, BlocketError> {
        query.validate()?;

        let first = PageRequest::first(query.to_wire_params());
        let NormalizedPage {
            items: mut ads,
            page_count,
        } = self.fetch_page(&first, overrides).await?;

        if page_count <= 1 {
            tracing::debug!("Query '{}' returned {} ads on a single page", query.query, ads.len());
            return Ok(ads);
        }

        tracing::debug!("Query '{}' spans {} pages", query.query, page_count);

        // Page requests are built as they are issued; `page_count` comes from the server
        match self.strategy {
            PageStrategy::Sequential => {
                for page in 2..=page_count {
                    let request = first.for_page(page);
                    let fetched = self
                        .fetch_page(&request, overrides)
                        .await
                        .map_err(|e| with_page_context(page, e))?;
                    ads.extend(fetched.items);
                }
            }
            PageStrategy::Concurrent { max_in_flight } => {
                let limit = max_in_flight.map_or_else(
                    || usize::try_from(page_count - 1).unwrap_or(usize::MAX),
                    NonZeroUsize::get,
                );
                let first = &first;

                // `buffered` yields results in page order, whatever the completion order
                let mut pages = stream::iter(2..=page_count)
                    .map(|page| async move {
                        let request = first.for_page(page);
                        (page, self.fetch_page(&request, overrides).await)
                    })
                    .buffered(limit);

                while let Some((page, result)) = pages.next().await {
                    let fetched = result.map_err(|e| with_page_context(page, e))?;
                    ads.extend(fetched.items);
                }
            }
        }

        tracing::info!(
            "Query '{}' returned {} ads across {} pages",
            query.query,
            ads.len(),
            page_count
        );

        Ok(ads)
    }

    /// Executes one page request and normalizes its payload
    async fn fetch_page(
        &self,
        request: &PageRequest,
        overrides: &HeaderMap,
    ) -> Result<NormalizedPage, BlocketError> {
        tracing::debug!("Fetching page {} from {}", request.page, self.search_url);

        let raw = self
            .transport
            .execute_with_headers(&self.search_url, &request.params(), overrides)
            .await?;

        self.shape.normalize(raw).map_err(|e| {
            tracing::warn!("Malformed response for page {}: {}", request.page, e);
            BlocketError::MalformedResponse {
                page: request.page,
                reason: e.to_string(),
            }
        })
    }
}

/// Attaches the failing page index to errors that lack it
fn with_page_context(page: u32, error: BlocketError) -> BlocketError {
    match error {
        e @ BlocketError::MalformedResponse { .. } => e,
        e => BlocketError::Page {
            page,
            source: Box::new(e),
        },
    }
}
