//! Search query construction
//!
//! This module turns a caller's friendly query description into the wire
//! parameters the search endpoint expects:
//! - `QueryConfig`: the merged, fully-defaulted parameters of one search
//! - `PageRequest`: one page's parameters, derived from a `QueryConfig`

use crate::config::QueryDefaults;
use crate::BlocketError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Wire name of the page index parameter
pub const PAGE_PARAM: &str = "page";

/// Kind of listing to search for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingType {
    #[serde(rename = "s")]
    Selling,
    #[serde(rename = "b")]
    Buying,
    #[serde(rename = "a")]
    All,
}

impl ListingType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Selling => "s",
            Self::Buying => "b",
            Self::All => "a",
        }
    }
}

/// Ad status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
    All,
}

impl Status {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// Search parameters for one `find` call
///
/// Only `query` is required. Unset fields are filled from the client's
/// configured [`QueryDefaults`] before the search is issued; fields still
/// unset after merging are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Free-text search query
    pub query: String,
    /// Maximum number of results per page
    pub limit: Option<u32>,
    /// Sorting order (`rel` for relevance)
    pub sort: Option<String>,
    pub listing_type: Option<ListingType>,
    pub status: Option<Status>,
    /// Maximum distance in kilometers from the search location
    pub geolocation: Option<u32>,
    /// Additional fields to include in the response
    pub include: Option<String>,
}

impl QueryConfig {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn listing_type(mut self, listing_type: ListingType) -> Self {
        self.listing_type = Some(listing_type);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn geolocation(mut self, km: u32) -> Self {
        self.geolocation = Some(km);
        self
    }

    pub fn include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }

    /// Fails with `InvalidQuery` if the query string is empty or blank
    pub fn validate(&self) -> Result<(), BlocketError> {
        if self.query.trim().is_empty() {
            return Err(BlocketError::InvalidQuery(
                "query string is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns a copy with every unset field taken from `defaults`
    pub fn merged_with(&self, defaults: &QueryDefaults) -> Self {
        Self {
            query: self.query.clone(),
            limit: self.limit.or(defaults.limit),
            sort: self.sort.clone().or_else(|| defaults.sort.clone()),
            listing_type: self.listing_type.or(defaults.listing_type),
            status: self.status.or(defaults.status),
            geolocation: self.geolocation.or(defaults.geolocation),
            include: self.include.clone().or_else(|| defaults.include.clone()),
        }
    }

    /// Maps the friendly field names onto the provider's wire names
    pub fn to_wire_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("q".to_string(), self.query.clone())];

        if let Some(limit) = self.limit {
            params.push(("lim".to_string(), limit.to_string()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort".to_string(), sort.clone()));
        }
        if let Some(listing_type) = self.listing_type {
            params.push(("st".to_string(), listing_type.as_wire().to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status".to_string(), status.as_wire().to_string()));
        }
        if let Some(gl) = self.geolocation {
            params.push(("gl".to_string(), gl.to_string()));
        }
        if let Some(include) = &self.include {
            params.push(("include".to_string(), include.clone()));
        }

        params
    }
}

/// Wire parameters for a single page of a search
///
/// All pages of one search share the same base parameters; only the page
/// index differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page index
    pub page: u32,
    base: Arc<Vec<(String, String)>>,
}

impl PageRequest {
    /// Creates the first page request for a search
    pub fn first(base: Vec<(String, String)>) -> Self {
        Self {
            page: 1,
            base: Arc::new(base),
        }
    }

    /// Creates the request for another page of the same search
    pub fn for_page(&self, page: u32) -> Self {
        Self {
            page,
            base: Arc::clone(&self.base),
        }
    }

    /// Returns the full parameter list for this page
    ///
    /// The first page is sent without a page index so that it is identical
    /// to a plain, unpaginated search.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = self.base.as_ref().clone();
        if self.page > 1 {
            params.push((PAGE_PARAM.to_string(), self.page.to_string()));
        }
        params
    }
}
