//! Listing crawler - paginates category search results
//!
//! For each category the crawler walks result pages from 1 upward. Every fetched page
//! is saved as raw HTML; pages carrying an embedded payload are also saved as
//! pretty-printed JSON. Pagination state is threaded through [`PaginationState`] and the
//! loop stops on the first [`StopReason`].

use crate::catalog::Category;
use crate::config::{Config, ListingConfig};
use crate::crawler::extract::{extract_embedded_json, listing_offers};
use crate::crawler::fetcher::RetryingFetcher;
use crate::output::ListingReport;
use crate::state::{PageOutcome, PaginationState, StopReason};
use crate::storage::{write_atomic, write_pretty_json, CategoryDir};
use crate::{HarvestError, Result};
use serde_json::Value;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// One fetched search-results page
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub category_id: u32,
    pub page_number: u32,
    pub raw_html: String,

    /// Embedded payload, if the page carried one
    pub payload: Option<Value>,

    /// Grouped offers on this page
    pub offer_count: u64,

    /// Grouped offers in the whole category, as reported by this page
    pub total_offer_count: u64,
}

impl ListingPage {
    /// Extracts the payload and offer counts from a fetched page
    ///
    /// A page without the embedded script yields `payload: None`; a payload missing
    /// the offer paths is an error.
    pub fn parse(category_id: u32, page_number: u32, raw_html: String) -> Result<Self> {
        let (payload, offer_count, total_offer_count) = match extract_embedded_json(&raw_html) {
            Ok(payload) => {
                let offers = listing_offers(&payload)?;
                let (count, total) = (offers.grouped.len() as u64, offers.total_count);
                (Some(payload), count, total)
            }
            Err(HarvestError::MissingEmbeddedData) => (None, 0, 0),
            Err(e) => return Err(e),
        };

        Ok(Self {
            category_id,
            page_number,
            raw_html,
            payload,
            offer_count,
            total_offer_count,
        })
    }

    pub fn outcome(&self) -> PageOutcome {
        match self.payload {
            Some(_) => PageOutcome::Parsed {
                offers: self.offer_count,
                total: self.total_offer_count,
            },
            None => PageOutcome::NoData,
        }
    }
}

/// Result of crawling one category
#[derive(Debug, Clone)]
pub struct CategoryListing {
    pub category: Category,
    pub state: PaginationState,
    pub stop: StopReason,
    pub report: ListingReport,
}

/// Paginates category search results and persists every page
pub struct ListingCrawler {
    fetcher: RetryingFetcher,
    listing_dir: PathBuf,
    search_path: String,
    limits: ListingConfig,
    cancel: CancellationToken,
}

impl ListingCrawler {
    /// Creates a crawler with its own fetcher
    ///
    /// `cancel` stops the crawl between pages and interrupts in-flight requests.
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self> {
        Ok(Self {
            fetcher: RetryingFetcher::new(&config.site, config.retry)?,
            listing_dir: config.paths.listing_dir.clone(),
            search_path: config.site.search_path.clone(),
            limits: config.listing,
            cancel,
        })
    }

    pub fn fetcher(&self) -> &RetryingFetcher {
        &self.fetcher
    }

    /// Crawls every category in order
    ///
    /// Only cancellation aborts the run; every other failure is confined to its page
    /// or category and counted in the report.
    pub async fn crawl_all(&mut self, categories: &[Category]) -> Result<ListingReport> {
        let mut report = ListingReport::default();

        for (index, category) in categories.iter().enumerate() {
            tracing::info!(
                "Category {} of {} - '{}' ({}) fetching...",
                index + 1,
                categories.len(),
                category.name,
                category.id
            );

            match self.crawl_category(category).await {
                Ok(listing) => report.merge(&listing.report),
                Err(e) if e.is_cancelled() => {
                    tracing::warn!("Listing crawl cancelled during {}", category);
                    report.http_requests = self.fetcher.request_count();
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Skipping category {}: {}", category, e);
                    report.categories_skipped += 1;
                    report.record_failure(e.kind());
                }
            }
        }

        report.http_requests = self.fetcher.request_count();
        Ok(report)
    }

    /// Crawls one category's result pages until a stop condition holds
    ///
    /// Runs at least once. Fails only if the category directory cannot be prepared
    /// or the crawl is cancelled.
    pub async fn crawl_category(&mut self, category: &Category) -> Result<CategoryListing> {
        let dir = CategoryDir::new(&self.listing_dir, category);
        dir.ensure(category, &self.cancel).await?;

        let requests_before = self.fetcher.request_count();
        let mut report = ListingReport::default();
        let mut state = PaginationState::new();

        let stop = loop {
            if self.cancel.is_cancelled() {
                return Err(HarvestError::Cancelled);
            }

            tracing::info!(
                "Getting page {} of '{}' ({})",
                state.page,
                category.name,
                category.id
            );
            let outcome = self.process_page(category, &dir, state.page).await?;
            report.record_page(&outcome);
            state = state.advance(&outcome);

            if let Some(reason) = state.stop_reason(&self.limits) {
                break reason;
            }
        };

        if state.stopped_short(stop) {
            tracing::warn!(
                "'{}' stopped early ({:?}): {} of {} offers over {} pages",
                category.name,
                stop,
                state.processed,
                state.total,
                state.page - 1
            );
        } else {
            tracing::info!(
                "'{}' done: {} of {} offers over {} pages",
                category.name,
                state.processed,
                state.total,
                state.page - 1
            );
        }

        report.record_stop(stop);
        report.http_requests = self.fetcher.request_count() - requests_before;

        Ok(CategoryListing {
            category: category.clone(),
            state,
            stop,
            report,
        })
    }

    /// Fetches and persists one page, confining any failure other than cancellation
    async fn process_page(
        &mut self,
        category: &Category,
        dir: &CategoryDir,
        page: u32,
    ) -> Result<PageOutcome> {
        let path = category.search_path(&self.search_path, page);

        let result = match self.fetcher.fetch(&path, &self.cancel).await {
            Ok(html) => self.persist_page(category, dir, page, html).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                tracing::warn!(
                    "Error fetching page {} of '{}' ({}) from {}: {}",
                    page,
                    category.name,
                    category.id,
                    path,
                    e
                );
                Ok(PageOutcome::Failed(e.kind()))
            }
        }
    }

    async fn persist_page(
        &self,
        category: &Category,
        dir: &CategoryDir,
        page: u32,
        html: String,
    ) -> Result<PageOutcome> {
        write_atomic(
            &dir.listing_html(category.id, page),
            html.as_bytes(),
            &self.cancel,
        )
        .await?;

        let listing = ListingPage::parse(category.id, page, html)?;
        let outcome = listing.outcome();

        match &listing.payload {
            Some(payload) => {
                write_pretty_json(&dir.listing_json(category.id, page), payload, &self.cancel)
                    .await?;
                tracing::debug!(
                    "Page {} of '{}': {} offers (total {})",
                    page,
                    category.name,
                    listing.offer_count,
                    listing.total_offer_count
                );
            }
            None => tracing::warn!(
                "Page {} of '{}' ({}) has no embedded payload",
                page,
                category.name,
                category.id
            ),
        }

        Ok(outcome)
    }
}
