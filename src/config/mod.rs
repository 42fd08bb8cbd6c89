//! Configuration module for the Blocket client
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file (or no file at all) yields a client
//! that talks to the public Blocket endpoints.
//!
//! # Example
//!
//! ```no_run
//! use blocket_client::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("blocket.toml")).unwrap();
//! println!("Token retries: {}", config.retry_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_headers, ClientConfig, LogLevel, LookupStrategy, PageStrategyKind, QueryDefaults,
    DEFAULT_API_BASE_URL, DEFAULT_TOKEN_ENDPOINT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
