use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Desktop browser identity sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin all request paths are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path prefix of category search pages
    ///
    /// Requests go to `{search-path}/{slug};cc,{id}?pn={page}`. Defaults to `/praca`,
    /// where the live site serves them; point it elsewhere for mirrors or test servers.
    #[serde(rename = "search-path", default = "default_search_path")]
    pub search_path: String,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds", default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Filesystem locations
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// JSON array of `{name, id}` categories
    #[serde(rename = "categories-file")]
    pub categories_file: PathBuf,

    /// Root of the persisted listing tree
    #[serde(rename = "listing-dir")]
    pub listing_dir: PathBuf,

    /// Root of the persisted detail tree
    #[serde(rename = "details-dir")]
    pub details_dir: PathBuf,
}

/// Retry policy for non-success HTTP responses
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Linear backoff unit (milliseconds)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 5_000,
        }
    }
}

/// Bounds on the listing pagination loop
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListingConfig {
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Pages in a row that fail or carry no payload before a category is abandoned
    #[serde(rename = "max-consecutive-failures")]
    pub max_consecutive_failures: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_pages: 1_000,
            max_consecutive_failures: 5,
        }
    }
}

fn default_search_path() -> String {
    "/praca".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}
