//! Run reports aggregated from per-item outcomes
//!
//! Each phase folds the outcome of every page or offer into a report, so failure
//! counts and kinds are observable after a run without scraping the logs.

use crate::state::{OfferOutcome, PageOutcome, StopReason};
use crate::ErrorKind;
use std::collections::BTreeMap;

/// Listing phase statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingReport {
    /// Categories whose pagination loop ran
    pub categories: u64,

    /// Categories skipped because their output directory could not be prepared
    pub categories_skipped: u64,

    /// Pages with an extracted payload
    pub pages_parsed: u64,

    /// Pages saved as HTML without an embedded payload
    pub pages_without_data: u64,

    /// Grouped offers counted across parsed pages
    pub offers_seen: u64,

    /// Failed pages by error kind
    pub failures: BTreeMap<ErrorKind, u64>,

    /// How category loops ended
    pub stops: BTreeMap<StopReason, u64>,

    pub http_requests: u64,
}

impl ListingReport {
    pub fn record_page(&mut self, outcome: &PageOutcome) {
        match *outcome {
            PageOutcome::Parsed { offers, .. } => {
                self.pages_parsed += 1;
                self.offers_seen += offers;
            }
            PageOutcome::NoData => self.pages_without_data += 1,
            PageOutcome::Failed(kind) => self.record_failure(kind),
        }
    }

    pub fn record_failure(&mut self, kind: ErrorKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    pub fn record_stop(&mut self, reason: StopReason) {
        self.categories += 1;
        *self.stops.entry(reason).or_insert(0) += 1;
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Folds another report into this one
    pub fn merge(&mut self, other: &ListingReport) {
        self.categories += other.categories;
        self.categories_skipped += other.categories_skipped;
        self.pages_parsed += other.pages_parsed;
        self.pages_without_data += other.pages_without_data;
        self.offers_seen += other.offers_seen;
        for (kind, count) in &other.failures {
            *self.failures.entry(*kind).or_insert(0) += count;
        }
        for (reason, count) in &other.stops {
            *self.stops.entry(*reason).or_insert(0) += count;
        }
        self.http_requests += other.http_requests;
    }
}

/// Detail phase statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailReport {
    pub categories: u64,

    /// Listing payload files read
    pub listing_files: u64,

    pub offers_seen: u64,
    pub saved: u64,
    pub listing_only: u64,
    pub skipped: u64,

    /// Failed offers (and unreadable listing files) by error kind
    pub failures: BTreeMap<ErrorKind, u64>,

    pub http_requests: u64,
}

impl DetailReport {
    pub fn record_offer(&mut self, outcome: OfferOutcome) {
        self.offers_seen += 1;
        match outcome {
            OfferOutcome::Saved => self.saved += 1,
            OfferOutcome::ListingOnly => self.listing_only += 1,
            OfferOutcome::Skipped => self.skipped += 1,
            OfferOutcome::Failed(kind) => self.record_failure(kind),
        }
    }

    pub fn record_failure(&mut self, kind: ErrorKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }
}

/// Prints listing statistics to stdout
pub fn print_listing_report(report: &ListingReport) {
    println!("=== Listing Phase ===\n");

    println!("Overview:");
    println!("  Categories crawled: {}", report.categories);
    if report.categories_skipped > 0 {
        println!("  Categories skipped: {}", report.categories_skipped);
    }
    println!("  Pages parsed: {}", report.pages_parsed);
    println!("  Pages without payload: {}", report.pages_without_data);
    println!("  Grouped offers seen: {}", report.offers_seen);
    println!("  HTTP requests: {}", report.http_requests);
    println!();

    if !report.stops.is_empty() {
        println!("Category Endings:");
        for (reason, count) in &report.stops {
            println!("  {:?}: {}", reason, count);
        }
        println!();
    }

    print_failures(&report.failures);
}

/// Prints detail statistics to stdout
pub fn print_detail_report(report: &DetailReport) {
    println!("=== Detail Phase ===\n");

    println!("Overview:");
    println!("  Categories: {}", report.categories);
    println!("  Listing files read: {}", report.listing_files);
    println!("  Offers seen: {}", report.offers_seen);
    println!("  Saved: {}", report.saved);
    println!("  Listing only: {}", report.listing_only);
    println!("  Already downloaded: {}", report.skipped);
    println!("  HTTP requests: {}", report.http_requests);
    println!();

    print_failures(&report.failures);

    let attempted = report.offers_seen - report.skipped;
    let success_rate = if attempted > 0 {
        (report.saved as f64 / attempted as f64) * 100.0
    } else {
        100.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} offers fetched with details)",
        success_rate, report.saved, attempted
    );
}

fn print_failures(failures: &BTreeMap<ErrorKind, u64>) {
    if failures.is_empty() {
        return;
    }
    println!("Failures:");
    let mut counts: Vec<_> = failures.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1));
    for (kind, count) in counts {
        println!("  {:?}: {}", kind, count);
    }
    println!();
}
