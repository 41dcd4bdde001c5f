//! Crawler module for the two harvesting phases
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Embedded payload extraction from rendered HTML
//! - Category search-result pagination (listing phase)
//! - Offer detail download (detail phase)

mod details;
mod extract;
mod fetcher;
mod listing;

pub use details::{DetailCrawler, OfferDetail};
pub use extract::{
    detail_data, extract_embedded_json, listing_offers, navigate, ListingOffers, OfferSummary,
    EMBEDDED_DATA_SELECTOR,
};
pub use fetcher::{build_http_client, FailureClass, FetchResponse, RetryingFetcher};
pub use listing::{CategoryListing, ListingCrawler, ListingPage};

use crate::catalog::load_categories;
use crate::config::Config;
use crate::output::{DetailReport, ListingReport};
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Runs the listing phase
///
/// Loads the category catalog and crawls every category's search results into the
/// listing tree.
///
/// # Example
///
/// ```no_run
/// use pracuj_harvest::config::load_config;
/// use pracuj_harvest::crawler::run_listing;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_listing(&config, CancellationToken::new()).await?;
/// println!("{} pages parsed", report.pages_parsed);
/// # Ok(())
/// # }
/// ```
pub async fn run_listing(config: &Config, cancel: CancellationToken) -> Result<ListingReport> {
    let categories = load_categories(&config.paths.categories_file).await?;
    tracing::info!("Loaded {} categories", categories.len());

    let mut crawler = ListingCrawler::new(config, cancel)?;
    crawler.crawl_all(&categories).await
}

/// Runs the detail phase over the persisted listing tree
pub async fn run_details(config: &Config, cancel: &CancellationToken) -> Result<DetailReport> {
    let mut crawler = DetailCrawler::new(config)?;
    crawler.crawl_all_categories(cancel).await
}
