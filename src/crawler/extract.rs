//! Embedded hydration payload extraction
//!
//! The target site server-renders its pages with the JSON state needed for hydration
//! serialized into a single `<script id="__NEXT_DATA__">` node. This module is the only
//! place that knows about that convention and about the property paths inside it:
//! - Locating and parsing the script node
//! - Navigating the listing payload to its grouped offers
//! - Navigating the detail payload to the offer data
//!
//! Navigation fails loudly with [`HarvestError::MalformedPayload`] naming the missing
//! path; callers never receive partial data.

use crate::{HarvestError, Result};
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

/// Selector of the script node carrying the hydration payload
pub const EMBEDDED_DATA_SELECTOR: &str = "script#__NEXT_DATA__";

const JOB_OFFERS_PATH: &[&str] = &["props", "pageProps", "data", "jobOffers"];
const QUERIES_PATH: &[&str] = &["props", "pageProps", "dehydratedState", "queries"];

/// Extracts and parses the embedded hydration payload from an HTML document
///
/// # Returns
///
/// * `Ok(Value)` - The parsed payload
/// * `Err(HarvestError::MissingEmbeddedData)` - No matching script node
/// * `Err(HarvestError::MalformedPayload)` - The node's text is not valid JSON
///
/// # Example
///
/// ```
/// use pracuj_harvest::crawler::extract_embedded_json;
///
/// let html = r#"<html><body><script id="__NEXT_DATA__" type="application/json">{"page":"/"}</script></body></html>"#;
/// let payload = extract_embedded_json(html).unwrap();
/// assert_eq!(payload["page"], "/");
/// ```
pub fn extract_embedded_json(html: &str) -> Result<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(EMBEDDED_DATA_SELECTOR)
        .map_err(|e| HarvestError::HtmlParse(e.to_string()))?;

    let node = document
        .select(&selector)
        .next()
        .ok_or(HarvestError::MissingEmbeddedData)?;
    let text: String = node.text().collect();

    serde_json::from_str(&text).map_err(|e| HarvestError::MalformedPayload {
        path: format!("{} ({})", EMBEDDED_DATA_SELECTOR, e),
    })
}

/// Follows an object property chain, failing with the first missing segment's full path
pub fn navigate<'a>(value: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut current = value;
    for (depth, key) in path.iter().enumerate() {
        current = current.get(key).ok_or_else(|| malformed(&path[..=depth]))?;
    }
    Ok(current)
}

fn malformed(path: &[&str]) -> HarvestError {
    HarvestError::MalformedPayload {
        path: path.join("."),
    }
}

/// The grouped offers of one search-results page
#[derive(Debug, Clone, Copy)]
pub struct ListingOffers<'a> {
    /// Total grouped offers in the category, as reported by the site
    pub total_count: u64,

    /// Grouped offers on this page, in document order
    pub grouped: &'a [Value],
}

/// Reads the grouped offers and the category total from a listing payload
pub fn listing_offers(payload: &Value) -> Result<ListingOffers<'_>> {
    let job_offers = navigate(payload, JOB_OFFERS_PATH)?;

    let total_count = job_offers
        .get("groupedOffersTotalCount")
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed(&[JOB_OFFERS_PATH, &["groupedOffersTotalCount"]].concat()))?;

    let grouped = job_offers
        .get("groupedOffers")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(&[JOB_OFFERS_PATH, &["groupedOffers"]].concat()))?;

    Ok(ListingOffers {
        total_count,
        grouped: grouped.as_slice(),
    })
}

/// Reads the offer data object from a detail-page payload
///
/// Takes the first dehydrated query's `state.data`.
pub fn detail_data(payload: &Value) -> Result<&Value> {
    let queries = navigate(payload, QUERIES_PATH)?;
    let first = queries
        .as_array()
        .and_then(|queries| queries.first())
        .ok_or_else(|| malformed(&[QUERIES_PATH, &["0"]].concat()))?;
    navigate(first, &["state", "data"]).map_err(|_| {
        malformed(&[QUERIES_PATH, &["0", "state", "data"]].concat())
    })
}

/// Canonical view of one grouped offer
#[derive(Debug, Clone, PartialEq)]
pub struct OfferSummary {
    pub offer_id: u64,

    /// URL as published in the listing
    pub absolute_url: String,

    /// Path (plus query) relative to the site origin
    pub relative_url: String,

    /// The whole grouped-offer entry
    pub raw: Value,
}

impl OfferSummary {
    /// Builds the summary from a grouped-offer entry, using its first sub-offer
    ///
    /// The published URL is resolved against `base` and reduced to path and query,
    /// which strips the site origin from absolute URLs and keeps relative ones.
    pub fn from_grouped(entry: &Value, base: &Url) -> Result<Self> {
        let first = entry
            .get("offers")
            .and_then(Value::as_array)
            .and_then(|offers| offers.first())
            .ok_or_else(|| malformed(&["offers", "0"]))?;

        let offer_id = first
            .get("partitionId")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed(&["offers", "0", "partitionId"]))?;

        let absolute_url = first
            .get("offerAbsoluteUri")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(&["offers", "0", "offerAbsoluteUri"]))?
            .to_string();

        let resolved = base.join(&absolute_url)?;
        let relative_url = match resolved.query() {
            Some(query) => format!("{}?{}", resolved.path(), query),
            None => resolved.path().to_string(),
        };

        Ok(Self {
            offer_id,
            absolute_url,
            relative_url,
            raw: entry.clone(),
        })
    }
}
