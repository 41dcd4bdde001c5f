//! Output module for run reports
//!
//! This module handles:
//! - Aggregating per-page and per-offer outcomes into phase reports
//! - Printing those reports at the end of a run

pub mod stats;

pub use stats::{print_detail_report, print_listing_report, DetailReport, ListingReport};
