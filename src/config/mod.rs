//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating the TOML settings file that
//! supplies the target site, output locations, retry policy and pagination bounds.
//!
//! # Example
//!
//! ```no_run
//! use pracuj_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Listing pages go to: {}", config.paths.listing_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ListingConfig, PathsConfig, RetryConfig, SiteConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
