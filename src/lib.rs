//! Pracuj-Harvest: a two-phase job-offer harvester
//!
//! This crate paginates category search results on a job-listing site, persists the
//! embedded hydration payload of every page, and then walks the persisted listings to
//! download each offer's detail payload. Both phases are resumable from the files on disk.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed with status {status_code}: {body}")]
    FetchFailed { status_code: u16, body: String },

    #[error("No embedded hydration payload found in page")]
    MissingEmbeddedData,

    #[error("Malformed payload: missing or invalid '{path}'")]
    MalformedPayload { path: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTML parse error: {0}")]
    HtmlParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Category catalog error: {0}")]
    Catalog(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl HarvestError {
    /// Classifies this error for per-item failure accounting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FetchFailed { .. } => ErrorKind::FetchFailed,
            Self::MissingEmbeddedData => ErrorKind::MissingEmbeddedData,
            Self::MalformedPayload { .. } | Self::Json(_) => ErrorKind::MalformedPayload,
            Self::Http(_) | Self::UrlParse(_) => ErrorKind::Transport,
            Self::Io(_) => ErrorKind::Io,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) | Self::HtmlParse(_) | Self::Catalog(_) => ErrorKind::Other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Coarse error classification used as a key when aggregating per-item failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    FetchFailed,
    MissingEmbeddedData,
    MalformedPayload,
    Transport,
    Io,
    Cancelled,
    Other,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::Category;
pub use config::Config;
pub use state::{OfferOutcome, PageOutcome, PaginationState};
