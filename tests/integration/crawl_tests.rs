//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::time::Duration;
use sumi_sitemap::config::{
    Config, CrawlerConfig, OutputConfig, PublishConfig, RetryConfig, UserAgentConfig,
};
use sumi_sitemap::crawler::{crawl, crawl_with_cancellation, Coordinator};
use sumi_sitemap::url::canonicalize_absolute;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from `seed_url`
pub fn create_test_config(seed_url: &str, max_pages: usize) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: seed_url.to_string(),
            max_pages,
            request_delay_ms: 0,
            fetch_timeout_secs: 5,
            concurrency: 1,
            max_duration_secs: None,
        },
        retry: RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 5,
            backoff_factor: 2.0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            sitemap_path: "sitemap.xml".to_string(),
        },
        publish: PublishConfig::default(),
    }
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn paths(urls: &[sumi_sitemap::CanonicalUrl], base: &str) -> Vec<String> {
    urls.iter()
        .map(|u| u.as_str().trim_start_matches(base).to_string())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_single_origin() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/a">A</a>
            <a href="/b/">B</a>
            <a href="https://other.test/x">External</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/a",
        r#"<html><body><a href="/">Home</a><a href="c">C</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/b", "<html><body>No links</body></html>").await;
    mount_page(&server, "/c", r##"<a href="#top">Top</a><a href="/a?ref=c">A again</a>"##).await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/a", "/b", "/c"]);
    assert_eq!(result.stats.visited, 4);
    assert_eq!(result.stats.pages_expanded, 4);
    assert_eq!(result.stats.links_external, 1);
    assert!(!result.stats.truncated);
    assert!(!result.stats.cancelled);
}

#[tokio::test]
async fn test_result_is_sorted_and_canonical() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/zeta">z</a><a href="/alpha/">a</a><a href="/ALPHA">A</a><a href="/alpha#x">a</a>"#,
    )
    .await;
    mount_page(&server, "/zeta", "<html></html>").await;
    mount_page(&server, "/alpha", "<html></html>").await;
    mount_page(&server, "/ALPHA", "<html></html>").await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    let mut sorted = result.urls.clone();
    sorted.sort();
    assert_eq!(result.urls, sorted);

    for url in &result.urls {
        let again = canonicalize_absolute(url.as_str()).unwrap();
        assert_eq!(&again, url);
    }

    let mut deduped = result.urls.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), result.urls.len());
    assert_eq!(paths(&result.urls, &base), vec!["/", "/ALPHA", "/alpha", "/zeta"]);
}

#[tokio::test]
async fn test_robots_exclusion() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /private/\n").await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private/page">Secret</a><a href="/public">Public</a>"#,
    )
    .await;
    mount_page(&server, "/public", r#"<a href="/private/page">Secret again</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/public"]);
    assert_eq!(result.stats.robots_excluded, 1);
}

#[tokio::test]
async fn test_robots_agent_specific_group() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(
        &server,
        "User-agent: TestBot\nDisallow: /bot-free\n\nUser-agent: *\nAllow: /\n",
    )
    .await;
    mount_page(&server, "/", r#"<a href="/bot-free">x</a><a href="/ok">y</a>"#).await;
    mount_page(&server, "/ok", "<html></html>").await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();
    assert_eq!(paths(&result.urls, &base), vec!["/", "/ok"]);
}

#[tokio::test]
async fn test_robots_server_error_is_permissive() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/private/page">x</a>"#).await;
    mount_page(&server, "/private/page", "<html></html>").await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();
    assert_eq!(paths(&result.urls, &base), vec!["/", "/private/page"]);
}

#[tokio::test]
async fn test_transient_failure_retried_then_succeeds() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/flaky">flaky</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html(r#"<a href="/after">after</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/after", "<html></html>").await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/after", "/flaky"]);
    assert_eq!(result.stats.fetch_failures, 0);
}

#[tokio::test]
async fn test_persistent_failure_gives_up_and_continues() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/down">down</a><a href="/up">up</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "/up", "<html></html>").await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    // Failed URLs are still visited, just never expanded
    assert_eq!(paths(&result.urls, &base), vec!["/", "/down", "/up"]);
    assert_eq!(result.stats.fetch_failures, 1);
    assert_eq!(result.stats.pages_expanded, 2);
}

#[tokio::test]
async fn test_limit_truncates_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (1..=10)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", links).await;
    for i in 1..=10 {
        mount_page(&server, &format!("/p{}", i), "<html></html>").await;
    }

    let result = crawl(create_test_config(&base, 3)).await.unwrap();

    assert_eq!(result.urls.len(), 3);
    assert_eq!(paths(&result.urls, &base), vec!["/", "/p1", "/p2"]);
    assert!(result.stats.truncated);
    assert_eq!(result.stats.pending_discarded, 8);
}

#[tokio::test]
async fn test_limit_with_only_disallowed_leftovers_is_not_truncated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /private/\n").await;
    mount_page(
        &server,
        "/",
        r#"<a href="/a">a</a><a href="/private/1">1</a><a href="/private/2">2</a>"#,
    )
    .await;
    mount_page(&server, "/a", "<html></html>").await;

    let result = crawl(create_test_config(&base, 2)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/a"]);
    assert!(!result.stats.truncated);
    assert_eq!(result.stats.pending_discarded, 0);
    assert_eq!(result.stats.robots_excluded, 2);
}

#[tokio::test]
async fn test_limit_bound_with_concurrency() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (1..=20)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", links).await;
    for i in 1..=20 {
        mount_page(&server, &format!("/p{}", i), r#"<a href="/">home</a>"#).await;
    }

    let mut config = create_test_config(&base, 7);
    config.crawler.concurrency = 4;

    let result = crawl(config).await.unwrap();
    assert_eq!(result.urls.len(), 7);
    assert!(result.stats.truncated);
}

#[tokio::test]
async fn test_concurrent_crawl_visits_everything_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (1..=8)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", links.clone()).await;
    for i in 1..=8 {
        Mock::given(method("GET"))
            .and(path(format!("/p{}", i)))
            .respond_with(html(links.clone()))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&base, 100);
    config.crawler.concurrency = 4;
    config.crawler.request_delay_ms = 5;

    let result = crawl(config).await.unwrap();
    assert_eq!(result.urls.len(), 9);
}

#[tokio::test]
async fn test_non_html_not_parsed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/feed.xml">feed</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<rss><a href="/hidden">hidden</a></rss>"#, "application/rss+xml"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/feed.xml"]);
    assert_eq!(result.stats.non_html, 1);
}

#[tokio::test]
async fn test_redirect_target_is_crawled_as_link() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/old/">old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/docs/intro"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/docs/intro", r#"<a href="next">next</a>"#).await;
    mount_page(&server, "/docs/next", "<html></html>").await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(
        paths(&result.urls, &base),
        vec!["/", "/docs/intro", "/docs/next", "/old"]
    );
    assert_eq!(result.stats.redirects, 1);
}

#[tokio::test]
async fn test_trailing_slash_redirect_resolves_links_against_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/guide">guide</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/guide/"))
        .mount(&server)
        .await;
    mount_page(&server, "/guide/", r#"<a href="intro">intro</a>"#).await;
    mount_page(&server, "/guide/intro", "<html></html>").await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/guide", "/guide/intro"]);
    assert_eq!(result.stats.redirects, 0);
    assert_eq!(result.stats.pages_expanded, 3);
}

#[tokio::test]
async fn test_redirect_into_disallowed_path_is_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /private/\n").await;
    mount_page(&server, "/", r#"<a href="/go">go</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/private/page"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/go"]);
    assert_eq!(result.stats.redirects, 1);
    assert_eq!(result.stats.robots_excluded, 1);
}

#[tokio::test]
async fn test_redirect_off_origin_is_not_followed() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/out">out</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/out"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/landing", elsewhere.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/out"]);
    assert_eq!(result.stats.links_external, 1);
}

#[tokio::test]
async fn test_origin_containment() {
    let server = MockServer::start().await;
    let base = server.uri();

    // 127.0.0.1 and localhost are different hosts for the origin filter
    let port = url::Url::parse(&base).unwrap().port().unwrap();
    mount_page(
        &server,
        "/",
        format!(
            r#"<a href="http://localhost:{}/elsewhere">x</a><a href="https://example.org/">y</a>"#,
            port
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    let host = url::Url::parse(&base).unwrap().host_str().unwrap().to_string();
    assert!(result.urls.iter().all(|u| u.host_str() == Some(host.as_str())));
    assert_eq!(result.urls.len(), 1);
    assert_eq!(result.stats.links_external, 2);
}

#[tokio::test]
async fn test_other_port_on_same_host_is_external() {
    let server = MockServer::start().await;
    let other_port = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(r#"<a href="{}/admin">admin</a><a href="/home">home</a>"#, other_port.uri()),
    )
    .await;
    mount_page(&server, "/home", "<html></html>").await;
    Mock::given(method("GET"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&other_port)
        .await;

    let result = crawl(create_test_config(&base, 100)).await.unwrap();

    assert_eq!(paths(&result.urls, &base), vec!["/", "/home"]);
    assert_eq!(result.stats.links_external, 1);
}

#[tokio::test]
async fn test_cancellation_returns_partial_result() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/slow">slow</a><a href="/never">never</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<html></html>").set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    let result = crawl_with_cancellation(create_test_config(&base, 100), cancel)
        .await
        .unwrap();

    assert!(result.stats.cancelled);
    assert_eq!(paths(&result.urls, &base), vec!["/", "/slow"]);
}

#[tokio::test]
async fn test_time_budget_cancels_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/slow">slow</a><a href="/never">never</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<html></html>").set_delay(Duration::from_millis(1500)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&base, 100);
    config.crawler.max_duration_secs = Some(1);

    let result = crawl(config).await.unwrap();

    assert!(result.stats.cancelled);
    assert_eq!(paths(&result.urls, &base), vec!["/", "/slow"]);
}

#[tokio::test]
async fn test_politeness_delay_spaces_requests() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/a">a</a>"#).await;
    mount_page(&server, "/a", "<html></html>").await;

    let mut config = create_test_config(&base, 100);
    config.crawler.request_delay_ms = 100;

    let started = std::time::Instant::now();
    let result = crawl(config).await.unwrap();

    assert_eq!(result.urls.len(), 2);
    // robots.txt, "/" and "/a" are each followed by the delay
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[test]
fn test_coordinator_rejects_non_http_seed() {
    let config = create_test_config("mailto:someone@example.com", 10);
    assert!(Coordinator::new(config).is_err());
}
