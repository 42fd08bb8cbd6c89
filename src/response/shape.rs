//! Response envelope decoding
//!
//! Different revisions of the search API wrap results differently:
//!
//! | Shape | Items | Page count |
//! |-------|-------|------------|
//! | `Flat` | `data` | always 1 |
//! | `Counted` | `data` | `total_page_count` |
//! | `PagedEnvelope` | `docs` | `metadata.paging.last` |
//!
//! All provider-shape knowledge lives here; pagination only ever sees a
//! [`NormalizedPage`].

use crate::response::Ad;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A payload that matches none of the known envelopes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ShapeError(String);

/// Uniform view of one page of results
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPage {
    pub items: Vec<Ad>,
    /// Total number of pages needed for the complete result set
    pub page_count: u32,
}

/// Known response envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseShape {
    /// Items under `data`, no pagination metadata
    Flat,
    /// Items under `data` with an explicit `total_page_count`
    Counted,
    /// Items under `docs` with `metadata.paging.last`
    PagedEnvelope,
    /// Detect the envelope from the payload's top-level fields
    Auto,
}

impl ResponseShape {
    /// Picks the concrete envelope for a payload
    ///
    /// Concrete shapes resolve to themselves; `Auto` inspects the top-level
    /// fields only.
    pub fn resolve(self, raw: &Value) -> ResponseShape {
        match self {
            Self::Auto if raw.get("docs").is_some() => Self::PagedEnvelope,
            Self::Auto if raw.get("total_page_count").is_some() => Self::Counted,
            Self::Auto => Self::Flat,
            concrete => concrete,
        }
    }

    /// Normalizes a decoded payload into a page view
    ///
    /// # Returns
    ///
    /// * `Ok(NormalizedPage)` - The page's items and the total page count
    /// * `Err(ShapeError)` - The items field is missing or not an array, or
    ///   the page count is not a non-negative integer
    pub fn normalize(self, mut raw: Value) -> Result<NormalizedPage, ShapeError> {
        if !raw.is_object() {
            return Err(ShapeError(format!(
                "expected a JSON object, got {}",
                type_name(&raw)
            )));
        }

        match self.resolve(&raw) {
            Self::Flat | Self::Auto => Ok(NormalizedPage {
                items: take_items(&mut raw, "data")?,
                page_count: 1,
            }),
            Self::Counted => {
                let page_count = page_count_at(&raw, "/total_page_count")?;
                Ok(NormalizedPage {
                    items: take_items(&mut raw, "data")?,
                    page_count,
                })
            }
            Self::PagedEnvelope => {
                let page_count = page_count_at(&raw, "/metadata/paging/last")?;
                Ok(NormalizedPage {
                    items: take_items(&mut raw, "docs")?,
                    page_count,
                })
            }
        }
    }
}

/// Moves the item array out of `field`
fn take_items(raw: &mut Value, field: &str) -> Result<Vec<Ad>, ShapeError> {
    match raw.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => Ok(items.into_iter().map(Ad::new).collect()),
        None | Some(Value::Null) => Err(ShapeError(format!(
            "expected an array of ads at '{}', field is missing",
            field
        ))),
        Some(other) => Err(ShapeError(format!(
            "expected an array of ads at '{}', got {}",
            field,
            type_name(&other)
        ))),
    }
}

/// Reads a page count; an absent count means a single page
fn page_count_at(raw: &Value, pointer: &str) -> Result<u32, ShapeError> {
    match raw.pointer(pointer) {
        None | Some(Value::Null) => Ok(1),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                ShapeError(format!(
                    "expected a non-negative page count at '{}', got {}",
                    pointer, value
                ))
            }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
