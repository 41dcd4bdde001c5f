//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the job site and run both crawl phases
//! end-to-end against temporary output trees.

use pracuj_harvest::catalog::Category;
use pracuj_harvest::config::{
    Config, ListingConfig, PathsConfig, RetryConfig, SiteConfig, DEFAULT_USER_AGENT,
};
use pracuj_harvest::crawler::{run_details, run_listing, DetailCrawler, ListingCrawler};
use pracuj_harvest::state::StopReason;
use pracuj_harvest::storage::{read_manifest, CategoryDir};
use pracuj_harvest::{ErrorKind, HarvestError};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at `root` with fast retries
fn create_test_config(base_url: &str, root: &Path) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            search_path: "/praca".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 5,
        },
        paths: PathsConfig {
            categories_file: root.join("categories.json"),
            listing_dir: root.join("listing"),
            details_dir: root.join("offers"),
        },
        retry: RetryConfig {
            max_retries: 1,
            base_delay_ms: 5,
        },
        listing: ListingConfig {
            max_pages: 20,
            max_consecutive_failures: 3,
        },
    }
}

fn embed(payload: &Value) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Praca</title></head><body>
        <div id="__next"></div>
        <script id="__NEXT_DATA__" type="application/json">{}</script>
        </body></html>"#,
        payload
    )
}

fn grouped_offer(base_url: &str, offer_id: u64) -> Value {
    json!({
        "jobTitle": format!("Offer {}", offer_id),
        "offers": [
            {"partitionId": offer_id, "offerAbsoluteUri": format!("{}/oferta/{}", base_url, offer_id)},
            {"partitionId": offer_id + 100_000, "offerAbsoluteUri": format!("{}/oferta/{}", base_url, offer_id + 100_000)}
        ]
    })
}

fn listing_payload(base_url: &str, total: u64, offer_ids: &[u64]) -> Value {
    let grouped: Vec<Value> = offer_ids
        .iter()
        .map(|id| grouped_offer(base_url, *id))
        .collect();
    json!({"props": {"pageProps": {"data": {"jobOffers": {
        "groupedOffersTotalCount": total,
        "groupedOffers": grouped
    }}}}})
}

fn detail_payload(offer_id: u64) -> Value {
    json!({"props": {"pageProps": {"dehydratedState": {"queries": [
        {"state": {"data": {"offerId": offer_id, "jobTitle": format!("Offer {}", offer_id)}}}
    ]}}}})
}

async fn mount_listing_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/praca/it;cc,100"))
        .and(query_param("pn", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn write_categories(config: &Config, json: &str) {
    std::fs::write(&config.paths.categories_file, json).expect("Failed to write catalog");
}

/// Writes a listing tree as the listing phase would have
async fn seed_listing_tree(config: &Config, category: &Category, pages: &[Value]) {
    let dir = CategoryDir::new(&config.paths.listing_dir, category);
    dir.ensure(category, &CancellationToken::new())
        .await
        .expect("Failed to create listing dir");
    for (index, payload) in pages.iter().enumerate() {
        let page = index as u32 + 1;
        std::fs::write(
            dir.listing_json(category.id, page),
            serde_json::to_string_pretty(payload).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.listing_html(category.id, page), embed(payload)).unwrap();
    }
}

/// Cancels `cancel` after `after` from a background task
fn cancel_after(cancel: &CancellationToken, after: Duration) {
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        trigger.cancel();
    });
}

fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("Invalid JSON on disk")
}

#[tokio::test]
async fn test_end_to_end_single_offer() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());
    write_categories(&config, r#"[{"name": "it", "id": 100}]"#);

    let listing = listing_payload(&base_url, 1, &[42]);
    mount_listing_page(&server, 1, embed(&listing)).await;

    Mock::given(method("GET"))
        .and(path("/oferta/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(embed(&detail_payload(42))))
        .expect(1)
        .mount(&server)
        .await;

    // Listing phase
    let report = run_listing(&config, CancellationToken::new())
        .await
        .expect("Listing phase failed");
    assert_eq!(report.categories, 1);
    assert_eq!(report.pages_parsed, 1);
    assert_eq!(report.offers_seen, 1);
    assert_eq!(report.stops.get(&StopReason::Complete), Some(&1));

    let listing_dir = config.paths.listing_dir.join("it - 100");
    assert!(listing_dir.join("100-1.html").exists());
    assert_eq!(read_json(&listing_dir.join("100-1.json")), listing);
    assert!(!listing_dir.join("100-2.html").exists());

    let manifest = read_manifest(&listing_dir).await.unwrap().unwrap();
    assert_eq!(manifest.category(), Category::new(100, "it"));

    // Detail phase
    let cancel = CancellationToken::new();
    let report = run_details(&config, &cancel)
        .await
        .expect("Detail phase failed");
    assert_eq!(report.saved, 1);
    assert_eq!(report.http_requests, 1);

    let details_dir = config.paths.details_dir.join("it - 100");
    assert_eq!(
        read_json(&details_dir.join("42-details.json")),
        json!({"offerId": 42, "jobTitle": "Offer 42"})
    );
    assert_eq!(
        read_json(&details_dir.join("42-listing.json")),
        grouped_offer(&base_url, 42)
    );

    // Second detail run does no network work
    let report = run_details(&config, &cancel)
        .await
        .expect("Second detail phase failed");
    assert_eq!(report.http_requests, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.saved, 0);
}

#[tokio::test]
async fn test_pagination_stops_when_all_offers_seen() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());

    mount_listing_page(&server, 1, embed(&listing_payload(&base_url, 3, &[1, 2]))).await;
    mount_listing_page(&server, 2, embed(&listing_payload(&base_url, 3, &[3]))).await;

    let category = Category::new(100, "it");
    let mut crawler = ListingCrawler::new(&config, CancellationToken::new()).unwrap();
    let result = crawler.crawl_category(&category).await.unwrap();

    assert_eq!(result.stop, StopReason::Complete);
    assert_eq!(result.state.processed, 3);
    assert_eq!(result.state.total, 3);
    assert_eq!(crawler.fetcher().request_count(), 2);

    let dir = CategoryDir::new(&config.paths.listing_dir, &category);
    for page in [1, 2] {
        assert!(dir.listing_html(100, page).exists());
        assert!(dir.listing_json(100, page).exists());
    }
    assert!(!dir.listing_html(100, 3).exists());
}

#[tokio::test]
async fn test_failed_page_does_not_abort_category() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());

    // Page 1 fails on the first try and its single retry
    Mock::given(method("GET"))
        .and(path("/praca/it;cc,100"))
        .and(query_param("pn", "1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(2)
        .mount(&server)
        .await;
    mount_listing_page(&server, 2, embed(&listing_payload(&base_url, 1, &[9]))).await;

    let category = Category::new(100, "it");
    let mut crawler = ListingCrawler::new(&config, CancellationToken::new()).unwrap();
    let result = crawler.crawl_category(&category).await.unwrap();

    assert_eq!(result.stop, StopReason::Complete);
    assert_eq!(result.report.failures.get(&ErrorKind::FetchFailed), Some(&1));
    assert_eq!(result.report.pages_parsed, 1);

    let dir = CategoryDir::new(&config.paths.listing_dir, &category);
    assert!(!dir.listing_html(100, 1).exists());
    assert!(dir.listing_json(100, 2).exists());
}

#[tokio::test]
async fn test_failing_category_is_bounded() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), tmp.path());

    // Every page fails, so the total is never learned
    Mock::given(method("GET"))
        .and(path("/praca/it;cc,100"))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;

    let mut crawler = ListingCrawler::new(&config, CancellationToken::new()).unwrap();
    let result = crawler
        .crawl_category(&Category::new(100, "it"))
        .await
        .unwrap();

    assert_eq!(result.stop, StopReason::TooManyFailures);
    assert_eq!(result.state.page, 4);
    assert_eq!(result.state.total, 0);
}

#[tokio::test]
async fn test_page_without_payload_is_saved_as_html_only() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());

    mount_listing_page(
        &server,
        1,
        "<html><body><p>Chwilowo brak ofert</p></body></html>".to_string(),
    )
    .await;
    mount_listing_page(&server, 2, embed(&listing_payload(&base_url, 1, &[5]))).await;

    let category = Category::new(100, "it");
    let mut crawler = ListingCrawler::new(&config, CancellationToken::new()).unwrap();
    let result = crawler.crawl_category(&category).await.unwrap();

    assert_eq!(result.report.pages_without_data, 1);
    let dir = CategoryDir::new(&config.paths.listing_dir, &category);
    assert!(dir.listing_html(100, 1).exists());
    assert!(!dir.listing_json(100, 1).exists());
    assert!(dir.listing_json(100, 2).exists());
}

#[tokio::test]
async fn test_failed_offer_is_retried_on_next_run() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());
    let category = Category::new(100, "it");
    seed_listing_tree(
        &config,
        &category,
        &[listing_payload(&base_url, 2, &[42, 43])],
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/oferta/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(embed(&detail_payload(42))))
        .expect(1)
        .mount(&server)
        .await;
    // Two runs, each with one try and one retry
    Mock::given(method("GET"))
        .and(path("/oferta/43"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(4)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let details_dir = config.paths.details_dir.join("it - 100");

    let mut crawler = DetailCrawler::new(&config).unwrap();
    let first = crawler.crawl_all_categories(&cancel).await.unwrap();
    assert_eq!(first.saved, 1);
    assert_eq!(first.failures.get(&ErrorKind::FetchFailed), Some(&1));
    assert!(details_dir.join("42-details.json").exists());
    assert!(!details_dir.join("43-details.json").exists());
    assert!(!details_dir.join("43-listing.json").exists());

    let mut crawler = DetailCrawler::new(&config).unwrap();
    let second = crawler.crawl_all_categories(&cancel).await.unwrap();
    assert_eq!(second.skipped, 1);
    assert_eq!(second.offers_seen - second.skipped, 1);
    assert_eq!(second.http_requests, 2);
}

#[tokio::test]
async fn test_detail_page_without_payload_saves_listing_only() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());
    let category = Category::new(100, "it");
    seed_listing_tree(&config, &category, &[listing_payload(&base_url, 1, &[42])]).await;

    Mock::given(method("GET"))
        .and(path("/oferta/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Oferta wygasła</body></html>"))
        .expect(2)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let details_dir = config.paths.details_dir.join("it - 100");

    let report = run_details(&config, &cancel).await.unwrap();
    assert_eq!(report.listing_only, 1);
    assert!(details_dir.join("42-listing.json").exists());
    assert!(!details_dir.join("42-details.json").exists());

    // No details file yet, so the offer is fetched again
    let report = run_details(&config, &cancel).await.unwrap();
    assert_eq!(report.listing_only, 1);
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn test_legacy_directory_without_manifest() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());

    let legacy = config.paths.listing_dir.join("Finanse - Ekonomia - 7");
    std::fs::create_dir_all(&legacy).unwrap();
    std::fs::write(
        legacy.join("7-1.json"),
        listing_payload(&base_url, 1, &[11]).to_string(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/oferta/11"))
        .respond_with(ResponseTemplate::new(200).set_body_string(embed(&detail_payload(11))))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_details(&config, &CancellationToken::new()).await.unwrap();
    assert_eq!(report.saved, 1);
    assert!(config
        .paths
        .details_dir
        .join("Finanse - Ekonomia - 7")
        .join("11-details.json")
        .exists());
}

#[tokio::test]
async fn test_cancelled_detail_run_writes_nothing() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());
    let category = Category::new(100, "it");
    seed_listing_tree(&config, &category, &[listing_payload(&base_url, 1, &[42])]).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = run_details(&config, &cancel).await;
    assert!(matches!(result, Err(HarvestError::Cancelled)));
    assert!(!config
        .paths
        .details_dir
        .join("it - 100")
        .join("42-listing.json")
        .exists());
}

#[tokio::test]
async fn test_listing_categories_run_in_id_order() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());
    write_categories(
        &config,
        r#"[{"name": "Sales", "id": 300}, {"name": "it", "id": 100}]"#,
    );

    mount_listing_page(&server, 1, embed(&listing_payload(&base_url, 1, &[1]))).await;
    Mock::given(method("GET"))
        .and(path("/praca/sales;cc,300"))
        .and(query_param("pn", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(embed(&listing_payload(&base_url, 1, &[2]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = run_listing(&config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.categories, 2);
    assert_eq!(report.http_requests, 2);

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(
        paths,
        vec!["/praca/it;cc,100", "/praca/sales;cc,300"]
    );
}

#[tokio::test]
async fn test_empty_page_before_total_stops_short() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());

    mount_listing_page(&server, 1, embed(&listing_payload(&base_url, 100, &[1, 2]))).await;
    mount_listing_page(&server, 2, embed(&listing_payload(&base_url, 100, &[]))).await;
    Mock::given(method("GET"))
        .and(path("/praca/it;cc,100"))
        .and(query_param("pn", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut crawler = ListingCrawler::new(&config, CancellationToken::new()).unwrap();
    let result = crawler
        .crawl_category(&Category::new(100, "it"))
        .await
        .unwrap();

    assert_eq!(result.stop, StopReason::EmptyPage);
    assert_eq!(result.state.processed, 2);
    assert!(result.state.stopped_short(result.stop));
}

#[tokio::test]
async fn test_listing_cancelled_mid_category() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base_url, tmp.path());

    mount_listing_page(&server, 1, embed(&listing_payload(&base_url, 10, &[1, 2]))).await;
    Mock::given(method("GET"))
        .and(path("/praca/it;cc,100"))
        .and(query_param("pn", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(embed(&listing_payload(&base_url, 10, &[3, 4])))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/praca/it;cc,100"))
        .and(query_param("pn", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_millis(500));

    let category = Category::new(100, "it");
    let mut crawler = ListingCrawler::new(&config, cancel).unwrap();
    let started = tokio::time::Instant::now();
    let result = crawler.crawl_category(&category).await;

    assert!(matches!(result, Err(HarvestError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));

    let dir = CategoryDir::new(&config.paths.listing_dir, &category);
    assert!(dir.listing_json(100, 1).exists());
    assert!(!dir.listing_html(100, 2).exists());
    assert!(!dir.listing_json(100, 2).exists());
}

#[tokio::test]
async fn test_details_cancelled_during_backoff() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let mut config = create_test_config(&base_url, tmp.path());
    config.retry = RetryConfig {
        max_retries: 3,
        base_delay_ms: 10_000,
    };
    let category = Category::new(100, "it");
    seed_listing_tree(&config, &category, &[listing_payload(&base_url, 1, &[42])]).await;

    Mock::given(method("GET"))
        .and(path("/oferta/42"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_millis(200));

    let started = tokio::time::Instant::now();
    let result = run_details(&config, &cancel).await;

    assert!(matches!(result, Err(HarvestError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(5));

    let details_dir = config.paths.details_dir.join("it - 100");
    assert!(!details_dir.join("42-listing.json").exists());
    assert!(!details_dir.join("42-details.json").exists());
}
