//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PaginationState`: explicit accumulator threaded through a category's pagination loop
//! - `PageOutcome`: what happened to one search-results page
//! - `OfferOutcome`: what happened to one offer in the detail phase

mod outcome;
mod pagination;

// Re-export main types
pub use outcome::{OfferOutcome, PageOutcome};
pub use pagination::{PaginationState, StopReason};
