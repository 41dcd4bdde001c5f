/// Per-item outcomes recorded by the crawl loops
use crate::ErrorKind;
use std::fmt;

/// Result of processing one search-results page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Payload extracted; `offers` grouped offers on this page, `total` reported by the site
    Parsed { offers: u64, total: u64 },

    /// HTML was fetched and saved but carried no embedded payload
    NoData,

    /// The page could not be fetched or its payload could not be read
    Failed(ErrorKind),
}

/// Result of processing one offer in the detail phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// Both the details and the listing fragment were written
    Saved,

    /// Detail page had no embedded payload; only the listing fragment was written
    ListingOnly,

    /// A details file already existed
    Skipped,

    /// Nothing was written for this offer
    Failed(ErrorKind),
}

impl fmt::Display for OfferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved => write!(f, "saved"),
            Self::ListingOnly => write!(f, "listing only"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed(kind) => write!(f, "failed ({:?})", kind),
        }
    }
}
