//! Detail crawler - downloads every offer found in the persisted listings
//!
//! This module walks the listing tree written by the listing phase and, for each
//! grouped offer:
//! - Skips it if its details file already exists
//! - Fetches its detail page and extracts the offer data
//! - Writes the listing fragment, then the details file
//!
//! The details file is written last, so its presence means the offer is complete.

use crate::catalog::Category;
use crate::config::Config;
use crate::crawler::extract::{detail_data, extract_embedded_json, listing_offers, OfferSummary};
use crate::crawler::fetcher::RetryingFetcher;
use crate::output::DetailReport;
use crate::state::OfferOutcome;
use crate::storage::{category_dirs, file_exists, write_pretty_json, CategoryDir};
use crate::{HarvestError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Offer data extracted from a detail page
#[derive(Debug, Clone, PartialEq)]
pub struct OfferDetail {
    pub offer_id: u64,
    pub data: Value,
}

impl OfferDetail {
    pub fn from_payload(offer_id: u64, payload: &Value) -> Result<Self> {
        Ok(Self {
            offer_id,
            data: detail_data(payload)?.clone(),
        })
    }
}

/// Fetches offer detail pages for every persisted listing
pub struct DetailCrawler {
    fetcher: RetryingFetcher,
    listing_dir: PathBuf,
    details_dir: PathBuf,
}

impl DetailCrawler {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            fetcher: RetryingFetcher::new(&config.site, config.retry)?,
            listing_dir: config.paths.listing_dir.clone(),
            details_dir: config.paths.details_dir.clone(),
        })
    }

    pub fn fetcher(&self) -> &RetryingFetcher {
        &self.fetcher
    }

    /// Processes every category directory of the listing tree
    ///
    /// # Returns
    ///
    /// * `Ok(DetailReport)` - The walk finished; per-offer failures are in the report
    /// * `Err(HarvestError::Cancelled)` - `cancel` fired; files written so far remain
    /// * `Err(HarvestError::Io)` - The listing tree could not be read
    pub async fn crawl_all_categories(&mut self, cancel: &CancellationToken) -> Result<DetailReport> {
        let mut report = DetailReport::default();
        let categories = category_dirs(&self.listing_dir).await?;
        let requests_before = self.fetcher.request_count();

        for (index, (category, source)) in categories.iter().enumerate() {
            tracing::info!(
                "Main category {} of {} - '{}' ({})",
                index + 1,
                categories.len(),
                category.name,
                category.id
            );
            report.categories += 1;

            let result = self
                .crawl_category(category, source, cancel, &mut report)
                .await;
            report.http_requests = self.fetcher.request_count() - requests_before;

            match result {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    tracing::warn!(
                        "Detail crawl cancelled in {}: {} saved, {} skipped, {} failed so far",
                        category,
                        report.saved,
                        report.skipped,
                        report.total_failures()
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Skipping category {}: {}", category, e);
                    report.record_failure(e.kind());
                }
            }
        }

        Ok(report)
    }

    async fn crawl_category(
        &mut self,
        category: &Category,
        source: &CategoryDir,
        cancel: &CancellationToken,
        report: &mut DetailReport,
    ) -> Result<()> {
        let target = CategoryDir::new(&self.details_dir, category);
        target.ensure(category, cancel).await?;

        let pages = source.listing_pages(category.id).await?;
        for (position, (page, path)) in pages.iter().enumerate() {
            tracing::info!(
                "Category page {} of {} - '{}'",
                position + 1,
                pages.len(),
                category.name
            );
            report.listing_files += 1;

            let payload = match read_listing(path).await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!("Unreadable listing {}: {}", path.display(), e);
                    report.record_failure(e.kind());
                    continue;
                }
            };
            let offers = match listing_offers(&payload) {
                Ok(offers) => offers,
                Err(e) => {
                    tracing::warn!("Listing {} has no offers: {}", path.display(), e);
                    report.record_failure(e.kind());
                    continue;
                }
            };

            for (offer_index, entry) in offers.grouped.iter().enumerate() {
                if cancel.is_cancelled() {
                    return Err(HarvestError::Cancelled);
                }

                let summary = match OfferSummary::from_grouped(entry, self.fetcher.base_url()) {
                    Ok(summary) => summary,
                    Err(e) => {
                        tracing::warn!(
                            "Offer #{} on page {} of '{}' unreadable: {}",
                            offer_index,
                            page,
                            category.name,
                            e
                        );
                        report.record_offer(OfferOutcome::Failed(e.kind()));
                        continue;
                    }
                };

                tracing::debug!(
                    "Offer {} of {} ({})",
                    offer_index + 1,
                    offers.grouped.len(),
                    summary.offer_id
                );

                let outcome = match self.process_offer(&summary, &target, cancel).await {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(e) => {
                        tracing::warn!(
                            "Error during offer {} ({}) in '{}': {}",
                            summary.offer_id,
                            summary.relative_url,
                            category.name,
                            e
                        );
                        OfferOutcome::Failed(e.kind())
                    }
                };
                tracing::debug!("Offer {}: {}", summary.offer_id, outcome);
                report.record_offer(outcome);
            }
        }

        Ok(())
    }

    /// Downloads one offer unless its details file already exists
    pub async fn process_offer(
        &mut self,
        summary: &OfferSummary,
        target: &CategoryDir,
        cancel: &CancellationToken,
    ) -> Result<OfferOutcome> {
        let details_path = target.offer_details(summary.offer_id);
        if file_exists(&details_path).await? {
            tracing::debug!("{} already downloaded. Skipping", summary.offer_id);
            return Ok(OfferOutcome::Skipped);
        }

        tracing::info!(
            "Fetching offer {} from {}",
            summary.offer_id,
            summary.relative_url
        );
        let html = self.fetcher.fetch(&summary.relative_url, cancel).await?;
        let detail = match extract_embedded_json(&html) {
            Ok(payload) => Some(OfferDetail::from_payload(summary.offer_id, &payload)?),
            Err(HarvestError::MissingEmbeddedData) => {
                tracing::warn!(
                    "Offer {} page has no embedded payload; saving listing only",
                    summary.offer_id
                );
                None
            }
            Err(e) => return Err(e),
        };

        write_pretty_json(&target.offer_listing(summary.offer_id), &summary.raw, cancel).await?;

        match detail {
            Some(detail) => {
                write_pretty_json(&details_path, &detail.data, cancel).await?;
                Ok(OfferOutcome::Saved)
            }
            None => Ok(OfferOutcome::ListingOnly),
        }
    }
}

async fn read_listing(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}
