//! Response handling module
//!
//! This module provides the ad types returned to callers and the adapter
//! that turns each provider envelope into a uniform page view.
//!
//! # Components
//!
//! - `Ad`: an opaque ad record, forwarded verbatim
//! - `BlocketAd`: typed view of the fields the Blocket API is known to send
//! - `ResponseShape`: the known envelopes, each with its own decoder

mod ad;
mod shape;

// Re-export main types
pub use ad::{Ad, Advertiser, BlocketAd, Price, ID_FIELDS};
pub use shape::{NormalizedPage, ResponseShape, ShapeError};
