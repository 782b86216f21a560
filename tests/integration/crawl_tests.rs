//! Integration tests for the crawler
//!
//! Most tests drive the coordinator with an in-memory fetcher so the site
//! graph is exact. The last ones use wiremock to run the full HTTP crawl
//! cycle end-to-end.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_map::config::{Config, DedupPolicy};
use sumi_map::crawler::{crawl, Coordinator, FetchError, Fetched, Fetcher, HttpFetcher};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Canned page: outbound links, assets and an artificial fetch delay
#[derive(Clone, Default)]
struct FakePage {
    links: Vec<String>,
    assets: Vec<String>,
    delay: Option<Duration>,
}

/// Fetcher that serves canned pages and records every fetch
#[derive(Default)]
struct FakeFetcher {
    pages: HashMap<String, FakePage>,
    fetched: Mutex<Vec<String>>,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeFetcher {
    fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            FakePage {
                links: links.iter().map(|l| l.to_string()).collect(),
                ..FakePage::default()
            },
        );
        self
    }

    fn page_with_assets(mut self, url: &str, links: &[&str], assets: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            FakePage {
                links: links.iter().map(|l| l.to_string()).collect(),
                assets: assets.iter().map(|a| a.to_string()).collect(),
                delay: None,
            },
        );
        self
    }

    fn slow_page(mut self, url: &str, links: &[&str], delay: Duration) -> Self {
        self.pages.insert(
            url.to_string(),
            FakePage {
                links: links.iter().map(|l| l.to_string()).collect(),
                assets: vec![],
                delay: Some(delay),
            },
        );
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.fetched().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());

        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let page = self.pages.get(url.as_str()).cloned();
        if let Some(delay) = page.as_ref().and_then(|p| p.delay) {
            tokio::time::sleep(delay).await;
        }

        self.current.fetch_sub(1, Ordering::SeqCst);

        match page {
            Some(page) => Ok(Fetched {
                links: page.links.iter().map(|l| Url::parse(l).unwrap()).collect(),
                assets: page.assets.iter().map(|a| Url::parse(a).unwrap()).collect(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// The fake site from the original crawler tests
fn golang_site() -> FakeFetcher {
    FakeFetcher::default()
        .page(
            "http://golang.org/",
            &["http://golang.org/pkg/", "http://golang.org/cmd/"],
        )
        .page(
            "http://golang.org/pkg/",
            &[
                "http://golang.org/",
                "http://golang.org/cmd/",
                "http://golang.org/pkg/fmt/",
                "http://golang.org/pkg/os/",
            ],
        )
        .page(
            "http://golang.org/pkg/fmt/",
            &["http://golang.org/", "http://golang.org/pkg/"],
        )
        .page(
            "http://golang.org/pkg/os/",
            &["http://golang.org/", "http://golang.org/pkg/"],
        )
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_triangle_site_at_depth_two() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page("http://site.test/a", &["http://site.test/b", "http://site.test/c"])
            .page("http://site.test/b", &["http://site.test/a"])
            .page("http://site.test/c", &["http://site.test/a"]),
    );

    for policy in [DedupPolicy::InFlight, DedupPolicy::Completed] {
        let mut coordinator = Coordinator::new(Arc::clone(&fetcher)).with_dedup(policy);
        let report = coordinator.run("http://site.test/a", 2).await.unwrap();

        assert_eq!(
            sorted_keys(&report.pages),
            vec!["http://site.test/a", "http://site.test/b", "http://site.test/c"],
            "policy {:?}",
            policy
        );
        assert_eq!(report.total_requests, 3);
        assert_eq!(report.stats.skipped, 0);
        assert_eq!(report.stats.suppressed_links, 2);
    }

    // Each policy run fetched every page exactly once
    assert_eq!(fetcher.fetch_count("http://site.test/a"), 2);
    assert_eq!(fetcher.fetch_count("http://site.test/b"), 2);
    assert_eq!(fetcher.fetch_count("http://site.test/c"), 2);
}

#[tokio::test]
async fn test_zero_depth_skips_root() {
    let fetcher = Arc::new(golang_site());
    let mut coordinator = Coordinator::new(Arc::clone(&fetcher));

    let report = coordinator.run("http://golang.org/", 0).await.unwrap();

    assert!(report.pages.is_empty());
    assert_eq!(report.total_requests, 0);
    assert_eq!(report.stats.workers_spawned, 1);
    assert_eq!(report.stats.skipped, 1);
    assert!(fetcher.fetched().is_empty());
}

#[tokio::test]
async fn test_depth_one_fetches_only_root() {
    let fetcher = Arc::new(golang_site());
    let mut coordinator = Coordinator::new(Arc::clone(&fetcher));

    let report = coordinator.run("http://golang.org/", 1).await.unwrap();

    assert_eq!(sorted_keys(&report.pages), vec!["http://golang.org/"]);
    // Root plus two children that were spawned at depth zero and skipped
    assert_eq!(report.stats.workers_spawned, 3);
    assert_eq!(report.stats.skipped, 2);
    assert_eq!(report.total_requests, 1);
    assert_eq!(fetcher.fetched(), vec!["http://golang.org/"]);
}

#[tokio::test]
async fn test_golang_site_in_flight_policy() {
    let fetcher = Arc::new(golang_site());
    let mut coordinator = Coordinator::new(Arc::clone(&fetcher)).with_dedup(DedupPolicy::InFlight);

    let report = coordinator.run("http://golang.org/", 4).await.unwrap();

    assert_eq!(
        sorted_keys(&report.pages),
        vec![
            "http://golang.org/",
            "http://golang.org/pkg/",
            "http://golang.org/pkg/fmt/",
            "http://golang.org/pkg/os/",
        ]
    );
    // /cmd/ fails once and is never retried
    assert_eq!(report.stats.errored, 1);
    assert_eq!(report.stats.failures[0].url, "http://golang.org/cmd/");
    assert_eq!(fetcher.fetch_count("http://golang.org/cmd/"), 1);
    assert_eq!(report.total_requests, 5);
    assert_eq!(
        report.total_requests,
        report.stats.workers_spawned - report.stats.skipped
    );
}

#[tokio::test]
async fn test_golang_site_completed_policy_refetches_failed_urls() {
    let fetcher = Arc::new(golang_site());
    let mut coordinator =
        Coordinator::new(Arc::clone(&fetcher)).with_dedup(DedupPolicy::Completed);

    let report = coordinator.run("http://golang.org/", 4).await.unwrap();

    assert_eq!(report.pages.len(), 4);
    // Failed URLs never enter the visited map, so /pkg/ triggers /cmd/ again
    assert_eq!(report.stats.errored, 2);
    assert_eq!(fetcher.fetch_count("http://golang.org/cmd/"), 2);
    assert_eq!(report.total_requests, 6);
    assert_eq!(
        report.total_requests,
        report.stats.pages_completed + report.stats.errored
    );
}

#[tokio::test]
async fn test_off_site_links_are_recorded_but_not_fetched() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page(
                "http://site.test/",
                &[
                    "http://other.test/",
                    "http://site.test:8080/",
                    "https://site.test/secure",
                ],
            )
            .page("https://site.test/secure", &[])
            .page("http://other.test/", &[]),
    );
    let mut coordinator = Coordinator::new(Arc::clone(&fetcher));

    let report = coordinator.run("http://site.test/", 3).await.unwrap();

    assert_eq!(
        sorted_keys(&report.pages),
        vec!["http://site.test/", "https://site.test/secure"]
    );
    assert_eq!(fetcher.fetch_count("http://other.test/"), 0);
    assert_eq!(report.stats.off_site_links, 2);

    let root = &report.pages["http://site.test/"];
    let targets: Vec<&str> = root.link_targets().map(Url::as_str).collect();
    assert!(targets.contains(&"http://other.test/"));
}

#[tokio::test]
async fn test_fetch_error_is_absorbed() {
    // /x has no canned page and fails; /y succeeds
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page("http://site.test/", &["http://site.test/x", "http://site.test/y"])
            .page("http://site.test/y", &[]),
    );
    let mut coordinator = Coordinator::new(Arc::clone(&fetcher));

    let report = coordinator.run("http://site.test/", 5).await.unwrap();

    assert!(!report.pages.contains_key("http://site.test/x"));
    assert!(report.pages.contains_key("http://site.test/y"));
    assert_eq!(report.stats.errored, 1);
    assert_eq!(report.total_requests, 3);
}

#[tokio::test]
async fn test_failing_root_returns_empty_map() {
    let fetcher = Arc::new(FakeFetcher::default());
    let mut coordinator = Coordinator::new(fetcher);

    let report = coordinator.run("http://nowhere.test/", 3).await.unwrap();

    assert!(report.pages.is_empty());
    assert_eq!(report.total_requests, 1);
    assert_eq!(report.stats.errored, 1);
}

#[tokio::test]
async fn test_completed_policy_duplicate_fetch_race() {
    // B and C both link to D. D is slow, so both B and C complete while D is
    // still in flight.
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page("http://site.test/a", &["http://site.test/b", "http://site.test/c"])
            .page("http://site.test/b", &["http://site.test/d"])
            .page("http://site.test/c", &["http://site.test/d"])
            .slow_page("http://site.test/d", &[], Duration::from_millis(300)),
    );

    let mut coordinator =
        Coordinator::new(Arc::clone(&fetcher)).with_dedup(DedupPolicy::Completed);
    let report = coordinator.run("http://site.test/a", 3).await.unwrap();

    assert_eq!(report.pages.len(), 4);
    assert_eq!(fetcher.fetch_count("http://site.test/d"), 2);
    assert_eq!(report.stats.duplicate_pages, 1);
    assert_eq!(report.total_requests, 5);

    let fetcher = Arc::new(
        FakeFetcher::default()
            .page("http://site.test/a", &["http://site.test/b", "http://site.test/c"])
            .page("http://site.test/b", &["http://site.test/d"])
            .page("http://site.test/c", &["http://site.test/d"])
            .slow_page("http://site.test/d", &[], Duration::from_millis(300)),
    );

    let mut coordinator =
        Coordinator::new(Arc::clone(&fetcher)).with_dedup(DedupPolicy::InFlight);
    let report = coordinator.run("http://site.test/a", 3).await.unwrap();

    assert_eq!(report.pages.len(), 4);
    assert_eq!(fetcher.fetch_count("http://site.test/d"), 1);
    assert_eq!(report.stats.duplicate_pages, 0);
    assert_eq!(report.total_requests, 4);
}

#[tokio::test]
async fn test_equivalent_links_share_one_fetch() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page(
                "http://site.test/",
                &[
                    "http://site.test/docs?b=2&a=1",
                    "http://SITE.test/docs?a=1&b=2&utm_source=feed",
                    "http://site.test/docs?a=1&b=2#intro",
                ],
            )
            .page("http://site.test/docs?b=2&a=1", &[]),
    );
    let mut coordinator = Coordinator::new(Arc::clone(&fetcher));

    let report = coordinator.run("http://site.test/", 2).await.unwrap();

    assert_eq!(
        sorted_keys(&report.pages),
        vec!["http://site.test/", "http://site.test/docs?a=1&b=2"]
    );
    // The first spelling seen is the one requested
    assert_eq!(
        fetcher.fetched(),
        vec!["http://site.test/", "http://site.test/docs?b=2&a=1"]
    );
    assert_eq!(
        report.pages["http://site.test/docs?a=1&b=2"].url.as_str(),
        "http://site.test/docs?b=2&a=1"
    );
    assert_eq!(report.stats.suppressed_links, 2);
}

#[tokio::test]
async fn test_discovered_links_are_fetched_verbatim() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page(
                "http://site.test/",
                &[
                    "http://site.test/search?flag",
                    "http://site.test/p?path=/x/y&q=a~b",
                    "http://site.test/enc?name=a%20b",
                ],
            )
            .page("http://site.test/search?flag", &[])
            .page("http://site.test/p?path=/x/y&q=a~b", &[])
            .page("http://site.test/enc?name=a%20b", &[]),
    );
    let mut coordinator = Coordinator::new(Arc::clone(&fetcher));

    let report = coordinator.run("http://site.test/", 2).await.unwrap();

    let mut fetched = fetcher.fetched();
    fetched.sort();
    assert_eq!(
        fetched,
        vec![
            "http://site.test/",
            "http://site.test/enc?name=a%20b",
            "http://site.test/p?path=/x/y&q=a~b",
            "http://site.test/search?flag",
        ]
    );
    assert_eq!(report.stats.errored, 0);
    assert_eq!(
        sorted_keys(&report.pages),
        vec![
            "http://site.test/",
            "http://site.test/enc?name=a%20b",
            "http://site.test/p?path=/x/y&q=a~b",
            "http://site.test/search?flag",
        ]
    );
}

#[tokio::test]
async fn test_concurrency_cap_is_respected() {
    let children: Vec<String> = (0..12).map(|i| format!("http://site.test/{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();

    let mut fetcher = FakeFetcher::default().page("http://site.test/", &child_refs);
    for child in &children {
        fetcher = fetcher.slow_page(child, &[], Duration::from_millis(20));
    }
    let fetcher = Arc::new(fetcher);

    let mut coordinator = Coordinator::new(Arc::clone(&fetcher)).with_max_concurrency(3);
    let report = coordinator.run("http://site.test/", 2).await.unwrap();

    assert_eq!(report.pages.len(), 13);
    assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_assets_are_kept_on_pages() {
    let fetcher = Arc::new(FakeFetcher::default().page_with_assets(
        "http://site.test/",
        &[],
        &["http://site.test/logo.png", "http://cdn.test/app.js"],
    ));
    let mut coordinator = Coordinator::new(fetcher);

    let report = coordinator.run("http://site.test/", 1).await.unwrap();

    let root = &report.pages["http://site.test/"];
    let assets: Vec<&str> = root.assets.iter().map(Url::as_str).collect();
    assert_eq!(assets, vec!["http://site.test/logo.png", "http://cdn.test/app.js"]);
}

#[tokio::test]
async fn test_dyn_fetcher() {
    let fetcher: Arc<dyn Fetcher> = Arc::new(golang_site());
    let mut coordinator = Coordinator::new(fetcher);

    let report = coordinator.run("http://golang.org/", 2).await.unwrap();

    assert_eq!(
        sorted_keys(&report.pages),
        vec!["http://golang.org/", "http://golang.org/pkg/"]
    );
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

#[tokio::test]
async fn test_full_http_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Home</title>
            <link rel="stylesheet" href="/style.css">
            </head><body>
            <a href="/page1">Page 1</a>
            <a href="page2#top">Page 2</a>
            <a href="/missing">Missing</a>
            <a href="/data.json">Data</a>
            <a href="https://example.org/elsewhere">Elsewhere</a>
            <img src="/logo.png">
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(
            r#"<html><head><title>Page 1</title></head><body><a href="/">Home</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html(
            r#"<html><head><title>Page 2</title></head><body><a href="/page1">Back</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.crawler.max_depth = 3;
    config.fetcher.timeout_secs = 5;

    let report = crawl(&config, &format!("{}/", base_url))
        .await
        .expect("Crawl failed");

    assert_eq!(
        sorted_keys(&report.pages),
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );
    // 404 and non-HTML content both count as fetch errors
    assert_eq!(report.stats.errored, 2);
    assert_eq!(report.stats.off_site_links, 1);
    assert_eq!(report.total_requests, 5);

    let home = &report.pages[&format!("{}/", base_url)];
    let links: Vec<&str> = home.link_targets().map(Url::as_str).collect();
    assert_eq!(
        links,
        vec![
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
            format!("{}/missing", base_url),
            format!("{}/data.json", base_url),
            "https://example.org/elsewhere".to_string(),
        ]
    );
    let assets: Vec<&str> = home.assets.iter().map(Url::as_str).collect();
    assert_eq!(
        assets,
        vec![format!("{}/logo.png", base_url), format!("{}/style.css", base_url)]
    );
}

#[tokio::test]
async fn test_http_fetcher_resolves_against_redirect_target() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new/", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(html(r#"<html><body><a href="child">Child</a></body></html>"#))
        .mount(&mock_server)
        .await;

    let config = Config::default();
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetcher).unwrap();
    let fetched = fetcher
        .fetch(&Url::parse(&format!("{}/old", base_url)).unwrap())
        .await
        .expect("fetch failed");

    assert_eq!(fetched.links[0].as_str(), format!("{}/new/child", base_url));
}

#[tokio::test]
async fn test_http_crawl_requests_links_as_written() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body><a href="/search?flag">Search</a><a href="/p?path=/x/y&amp;q=a~b">P</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html("<html><body></body></html>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(html("<html><body></body></html>"))
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.crawler.max_depth = 2;

    let report = crawl(&config, &format!("{}/", base_url))
        .await
        .expect("Crawl failed");
    assert_eq!(report.pages.len(), 3);

    let mut queries: Vec<String> = mock_server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .filter_map(|request| request.url.query().map(str::to_string))
        .collect();
    queries.sort();
    assert_eq!(queries, vec!["flag", "path=/x/y&q=a~b"]);
}

#[tokio::test]
async fn test_invalid_target_is_rejected_before_crawling() {
    let result = crawl(&Config::default(), "definitely not a url").await;
    assert!(matches!(
        result,
        Err(sumi_map::SumiError::InvalidTarget { .. })
    ));
}
