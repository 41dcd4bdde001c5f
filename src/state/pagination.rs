/// Pagination state machine for one category's search results
///
/// The listing loop runs do-while style: it always fetches the first page, then feeds each
/// page's outcome through [`PaginationState::advance`] and asks
/// [`PaginationState::should_continue`] whether to fetch the next one.
use crate::config::ListingConfig;
use crate::state::PageOutcome;

/// Why the pagination loop for a category stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StopReason {
    /// Every reported offer was seen
    Complete,

    /// A page parsed fine but listed no offers
    EmptyPage,

    /// Too many pages in a row failed or carried no payload
    TooManyFailures,

    /// The page cap was reached
    PageLimit,
}

/// Accumulated pagination state for a single category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Next page to fetch (1-based)
    pub page: u32,

    /// Grouped offers seen so far across parsed pages
    pub processed: u64,

    /// Total reported by the most recent parsed page; 0 while unknown
    pub total: u64,

    pub consecutive_failures: u32,

    /// Offer count of the most recent parsed page
    last_page_offers: Option<u64>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    pub fn new() -> Self {
        Self {
            page: 1,
            processed: 0,
            total: 0,
            consecutive_failures: 0,
            last_page_offers: None,
        }
    }

    /// Applies the outcome of the current page and moves to the next page
    pub fn advance(self, outcome: &PageOutcome) -> Self {
        let mut next = self;
        match *outcome {
            PageOutcome::Parsed { offers, total } => {
                next.processed += offers;
                next.total = total;
                next.consecutive_failures = 0;
                next.last_page_offers = Some(offers);
            }
            PageOutcome::NoData | PageOutcome::Failed(_) => {
                next.consecutive_failures += 1;
                next.last_page_offers = None;
            }
        }
        next.page += 1;
        next
    }

    /// Returns the reason the loop must stop, if any
    pub fn stop_reason(&self, limits: &ListingConfig) -> Option<StopReason> {
        if self.last_page_offers == Some(0) {
            return Some(StopReason::EmptyPage);
        }
        if self.total > 0 && self.processed >= self.total {
            return Some(StopReason::Complete);
        }
        if self.total == 0 && self.last_page_offers.is_some() {
            // Parsed page reporting zero offers in total
            return Some(StopReason::Complete);
        }
        if self.consecutive_failures >= limits.max_consecutive_failures {
            return Some(StopReason::TooManyFailures);
        }
        if self.page > limits.max_pages {
            return Some(StopReason::PageLimit);
        }
        None
    }

    pub fn should_continue(&self, limits: &ListingConfig) -> bool {
        self.stop_reason(limits).is_none()
    }

    /// Returns true if stopping for `reason` left reported offers unseen
    ///
    /// An empty page after the total was reached is a clean finish; an empty page
    /// before that means the site ran out of results early.
    pub fn stopped_short(&self, reason: StopReason) -> bool {
        match reason {
            StopReason::Complete => false,
            StopReason::EmptyPage => self.processed < self.total,
            StopReason::TooManyFailures | StopReason::PageLimit => true,
        }
    }
}
