//! Bearer token handling
//!
//! The search API only answers requests carrying a short-lived bearer token
//! handed out by a separate endpoint. The server alone decides when a token
//! expires; the client learns of it from a failed call and refreshes.

mod token;

pub use token::{Token, TokenStore};
