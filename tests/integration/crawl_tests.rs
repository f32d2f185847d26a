//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl ring end-to-end.

use sitemapper::config::{Config, RuleKind};
use sitemapper::{
    DedupFilter, FetchWorker, LinkExtractor, Orchestrator, PageRecord, Retirement, ScopeFilter,
    SiteMapCollector, Stage,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.fetch.connect_timeout_secs = 2;
    config.fetch.response_header_timeout_secs = 2;
    config.fetch.request_timeout_secs = 5;
    config
}

/// Wires Dedup -> Scope -> Fetch -> SiteMap -> Extract
fn build_stages(config: &Config, seed: &str, map: &Arc<SiteMapCollector>) -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(DedupFilter::new()),
        Arc::new(ScopeFilter::new(seed).expect("Seed should have a host")),
        Arc::new(FetchWorker::new(&config.fetch).expect("Failed to build client")),
        Arc::clone(map) as Arc<dyn Stage>,
        Arc::new(LinkExtractor::from_config(&config.extract)),
    ]
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn crawl(config: &Config, seed: &str) -> (Vec<String>, sitemapper::crawler::CrawlReport) {
    let map = Arc::new(SiteMapCollector::new());
    let stages = build_stages(config, seed, &map);

    let report = tokio::time::timeout(
        Duration::from_secs(30),
        Orchestrator::from_config(&config.pipeline).run(PageRecord::new(seed), stages),
    )
    .await
    .expect("Crawl did not quiesce")
    .expect("Crawl failed");

    (map.urls(), report)
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/home",
        r#"<html><head><title>Home</title></head><body>
        <a href="/about">About</a>
        <a href="/team">Team</a>
        <a href="http://external1.com">External</a>
        <a href="ftp://www.run-test.com">Files</a>
        <img src="/img1.jpg">
        <img src="img2.png">
        </body></html>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/about",
        r#"<html><body><a href="/home">Home</a><a href="/team/">Team</a></body></html>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/team",
        r#"<html><body><a href="/home">Home</a><a href="about">About</a></body></html>"#,
    )
    .await;
    // Images fall through to wiremock's 404, which still counts as fetched

    let seed = format!("{}/home", base_url);
    let (urls, report) = crawl(&create_test_config(), &seed).await;

    let mut sorted = urls.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), urls.len(), "Sitemap contains duplicates");

    let mut expected: Vec<String> = ["/about", "/home", "/img1.jpg", "/img2.png", "/team"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    expected.sort();
    assert_eq!(sorted, expected);

    assert_eq!(report.stats.pages_fetched, 5);
    assert_eq!(report.stats.retired(Retirement::OutOfScope), 2);
    assert_eq!(report.stats.retired(Retirement::FetchFailed), 0);
    assert_eq!(report.stats.retired(Retirement::Abandoned), 0);
}

#[tokio::test]
async fn test_nofollow_links_are_skipped_by_default() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/home",
        r#"<a href="/public">Public</a><a href="/private" rel="nofollow">Private</a>"#,
    )
    .await;
    mount_page(&mock_server, "/public", "<p>public</p>").await;

    let seed = format!("{}/home", base_url);
    let (urls, _) = crawl(&create_test_config(), &seed).await;

    assert!(urls.contains(&format!("{}/public", base_url)));
    assert!(!urls.contains(&format!("{}/private", base_url)));
}

#[tokio::test]
async fn test_nofollow_links_followed_when_configured() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/home",
        r#"<a href="/public">Public</a><a href="/private" rel="nofollow">Private</a>"#,
    )
    .await;
    mount_page(&mock_server, "/public", "<p>public</p>").await;
    mount_page(&mock_server, "/private", "<p>private</p>").await;

    let mut config = create_test_config();
    config.extract.rules = vec![RuleKind::Anchor];

    let seed = format!("{}/home", base_url);
    let (urls, _) = crawl(&config, &seed).await;

    assert!(urls.contains(&format!("{}/private", base_url)));
    assert_eq!(urls.len(), 3);
}

#[tokio::test]
async fn test_unreachable_seed_terminates() {
    let seed = "http://127.0.0.1:1/home";
    let (urls, report) = crawl(&create_test_config(), seed).await;

    assert!(urls.is_empty());
    assert_eq!(report.stats.pages_fetched, 0);
    assert_eq!(report.stats.retired(Retirement::FetchFailed), 1);
}

#[tokio::test]
async fn test_rendered_sitemap_lists_each_page_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/home", r#"<a href="/home">Self</a><a href="/a">A</a>"#).await;
    mount_page(&mock_server, "/a", r#"<a href="/home">Home</a>"#).await;

    let map = Arc::new(SiteMapCollector::new());
    let config = create_test_config();
    let seed = format!("{}/home", base_url);
    let stages = build_stages(&config, &seed, &map);

    Orchestrator::from_config(&config.pipeline)
        .run(PageRecord::new(seed.as_str()), stages)
        .await
        .expect("Crawl failed");

    let document = map.render();
    assert!(document.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(document.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
    assert_eq!(document.matches("<url>").count(), 2);
    assert_eq!(
        document.matches(&format!("<loc>{}/home</loc>", base_url)).count(),
        1
    );
}
