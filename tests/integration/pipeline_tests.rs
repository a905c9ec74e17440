//! Integration tests for the scraping pipeline
//!
//! These tests use wiremock to create mock catalog servers and exercise
//! fetching, retrying, proxy routing and the full run end-to-end.

use catalog_ripple::config::{parse_config, Config};
use catalog_ripple::crawler::{run_scrape, Pipeline, RetryingFetcher};
use catalog_ripple::output::{CsvSink, JsonSink, Sink};
use catalog_ripple::{AttemptError, FetchError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration pointing at the given origin
fn create_test_config(origin: &str, pages: u32, max_attempts: u32) -> Config {
    parse_config(&format!(
        r#"
[scraper]
origin = "{origin}"
total-pages = {pages}
max-attempts = {max_attempts}
retry-delay-ms = 10
request-timeout-secs = 5

[scheduler]
max-concurrent-tasks = 1
requests-per-window = 20
window-ms = 10
"#
    ))
    .expect("Failed to parse test config")
}

/// Renders a listing page with one product per (slug, title) pair
fn listing_page(products: &[(&str, &str)]) -> String {
    let items: String = products
        .iter()
        .map(|(slug, title)| {
            format!(
                r#"<li><article class="product_pod">
                    <p class="star-rating Four"></p>
                    <h3><a href="{slug}/index.html" title="{title}">{title}</a></h3>
                    <p class="price_color">£12.34</p>
                    <p class="instock availability">In stock (12 available)</p>
                </article></li>"#
            )
        })
        .collect();

    format!(r#"<html><body><ol class="row">{items}</ol></body></html>"#)
}

async fn mount_page(server: &MockServer, index: u32, products: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path(format!("/catalogue/page-{}.html", index)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(products))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_succeeds_after_two_failures() {
    let mock_server = MockServer::start().await;

    // Mounted first, so it answers until exhausted
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1, 3);
    let fetcher = RetryingFetcher::with_rng(&config, StdRng::seed_from_u64(1))
        .expect("Failed to build fetcher");

    let url = format!("{}/catalogue/page-1.html", mock_server.uri());
    let page = fetcher.fetch(&url).await.expect("Fetch should succeed");

    assert_eq!(page.status, 200);
    assert_eq!(page.body, "<html>ok</html>");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_fetch_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1, 3);
    let fetcher = RetryingFetcher::with_rng(&config, StdRng::seed_from_u64(2))
        .expect("Failed to build fetcher");

    let url = format!("{}/catalogue/page-1.html", mock_server.uri());
    let error = fetcher.fetch(&url).await.expect_err("Fetch should fail");

    assert_eq!(error.attempts(), 3);
    match error {
        FetchError::ExhaustedRetries { last, .. } => {
            assert!(matches!(last, AttemptError::Status { status: 503, .. }));
        }
    }

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_unreachable_host_exhausts_retries() {
    // Nothing listens on port 1
    let address = "http://127.0.0.1:1".to_string();

    let config = create_test_config(&address, 1, 2);
    let fetcher = RetryingFetcher::with_rng(&config, StdRng::seed_from_u64(3))
        .expect("Failed to build fetcher");

    let error = fetcher
        .fetch(&format!("{}/catalogue/page-1.html", address))
        .await
        .expect_err("Fetch should fail");

    assert_eq!(error.attempts(), 2);
}

#[tokio::test]
async fn test_every_attempt_carries_identity_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .and(header_exists("accept"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1, 4);
    let fetcher = RetryingFetcher::with_rng(&config, StdRng::seed_from_u64(4))
        .expect("Failed to build fetcher");

    let result = fetcher
        .fetch(&format!("{}/catalogue/page-1.html", mock_server.uri()))
        .await;
    assert!(result.is_err());

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_requests_route_through_proxy_with_credentials() {
    // The mock server plays the proxy; the catalog host is never resolved
    let proxy_server = MockServer::start().await;
    let proxy_address = proxy_server.address();

    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .and(header("proxy-authorization", "Basic YWxpY2U6c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("via proxy"))
        .expect(1)
        .mount(&proxy_server)
        .await;

    let config = parse_config(&format!(
        r#"
[scraper]
origin = "http://catalog.test/"
total-pages = 1
max-attempts = 1

[proxy]
use-proxy = true

[[proxy.servers]]
host = "{}"
port = {}
username = "alice"
password = "secret"
"#,
        proxy_address.ip(),
        proxy_address.port()
    ))
    .expect("Failed to parse proxy config");

    let fetcher = RetryingFetcher::with_rng(&config, StdRng::seed_from_u64(5))
        .expect("Failed to build fetcher");

    let page = fetcher
        .fetch("http://catalog.test/catalogue/page-1.html")
        .await
        .expect("Proxied fetch should succeed");

    assert_eq!(page.body, "via proxy");
}

#[tokio::test]
async fn test_proxy_is_reselected_on_every_attempt() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    for server in [&first, &second] {
        Mock::given(method("GET"))
            .and(path("/catalogue/page-1.html"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(502))
            .mount(server)
            .await;
    }

    let config = parse_config(&format!(
        r#"
[scraper]
origin = "http://catalog.test/"
total-pages = 1
max-attempts = 16
retry-delay-ms = 1

[proxy]
use-proxy = true

[[proxy.servers]]
host = "{}"
port = {}

[[proxy.servers]]
host = "{}"
port = {}
"#,
        first.address().ip(),
        first.address().port(),
        second.address().ip(),
        second.address().port()
    ))
    .expect("Failed to parse proxy config");

    let fetcher = RetryingFetcher::with_rng(&config, StdRng::seed_from_u64(8))
        .expect("Failed to build fetcher");

    let error = fetcher
        .fetch("http://catalog.test/catalogue/page-1.html")
        .await
        .expect_err("Fetch should fail");
    assert_eq!(error.attempts(), 16);

    let via_first = first.received_requests().await.unwrap().len();
    let via_second = second.received_requests().await.unwrap().len();

    assert_eq!(via_first + via_second, 16);
    assert!(via_first > 0, "first proxy never used");
    assert!(via_second > 0, "second proxy never used");
}

#[tokio::test]
async fn test_failed_page_is_isolated() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        1,
        &[("sharp-objects_997", "Sharp Objects"), ("soumission_998", "Soumission")],
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/catalogue/page-2.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, 3, &[("sapiens_996", "Sapiens")]).await;

    let config = create_test_config(&mock_server.uri(), 3, 2);
    let pipeline =
        Pipeline::with_rng(config, StdRng::seed_from_u64(6)).expect("Failed to create pipeline");

    let report = pipeline.run().await.expect("Run should complete");

    let mut titles: Vec<String> = report
        .records
        .iter()
        .filter_map(|r| r.title.clone())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Sapiens", "Sharp Objects", "Soumission"]);

    assert_eq!(report.summary.pages_total, 3);
    assert_eq!(report.summary.pages_succeeded, 2);
    assert_eq!(report.summary.failed_pages, vec![2]);
    assert_eq!(report.summary.records, 3);

    let sapiens = report
        .records
        .iter()
        .find(|r| r.title.as_deref() == Some("Sapiens"))
        .unwrap();
    assert_eq!(sapiens.price, Some(12.34));
    assert_eq!(sapiens.rating, Some(4));
    assert_eq!(sapiens.availability, 12);
    assert_eq!(
        sapiens.product_url,
        format!("{}/sapiens_996/index.html", mock_server.uri())
    );
}

#[tokio::test]
async fn test_full_run_writes_sinks() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, &[("a_1", "Alpha"), ("b_2", "Beta")]).await;
    mount_page(&mock_server, 2, &[("c_3", "Gamma, the Third")]).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let json = JsonSink::new(dir.path().join("products.json"));
    let csv = CsvSink::new(dir.path().join("products.csv"));
    let sinks: [&dyn Sink; 2] = [&json, &csv];

    let config = create_test_config(&mock_server.uri(), 2, 1);
    let report = run_scrape(config, &sinks).await.expect("Run should complete");

    assert_eq!(report.records.len(), 3);

    let csv_text = std::fs::read_to_string(csv.path()).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines.len(), report.records.len() + 1);
    assert_eq!(lines[0], "title,price,rating,availability,productUrl");

    let json_text = std::fs::read_to_string(json.path()).unwrap();
    let items: Vec<serde_json::Value> = serde_json::from_str(&json_text).unwrap();
    assert_eq!(items.len(), 3);
    for item in &items {
        assert_eq!(item["price"], 12.34);
        assert_eq!(item["rating"], 4);
        assert!(item["productUrl"].as_str().unwrap().starts_with("http://"));
    }
}

#[tokio::test]
async fn test_all_pages_failing_yields_empty_collection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 2, 1);
    let pipeline =
        Pipeline::with_rng(config, StdRng::seed_from_u64(7)).expect("Failed to create pipeline");

    let report = pipeline.run().await.expect("Run should complete");

    assert!(report.records.is_empty());
    assert_eq!(report.summary.failed_pages, vec![1, 2]);
    assert_eq!(report.summary.pages_succeeded, 0);
}
