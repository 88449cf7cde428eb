//! End-to-end tests from crawl to published sitemap

use crate::crawl_tests::create_test_config;
use std::time::Duration;
use sumi_sitemap::config::ObjectStoreConfig;
use sumi_sitemap::crawler::crawl;
use sumi_sitemap::output::write_sitemap;
use sumi_sitemap::publish::{publish_all, publishers_from_config, PublishReceipt};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crawl_write_and_upload() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                r#"<a href="/about">About</a><a href="/shop?item=1">Shop</a>"#,
                "text/html",
            ),
        )
        .mount(&site)
        .await;
    for page in ["/about", "/shop"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"),
            )
            .mount(&site)
            .await;
    }

    let store = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/sitemaps/sitemap.xml"))
        .and(header("content-type", "application/xml"))
        .and(header("x-amz-acl", "public-read"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&store)
        .await;

    let mut config = create_test_config(&base, 100);
    config.publish.object_store = Some(ObjectStoreConfig {
        url: format!("{}/sitemaps/sitemap.xml", store.uri()),
        acl: Some("public-read".to_string()),
        token_env: None,
        public_url: Some("https://www.example.com/sitemap.xml".to_string()),
    });
    let publish_config = config.publish.clone();
    let user_agent = config.user_agent.clone();

    let result = crawl(config).await.unwrap();
    assert_eq!(result.urls.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let sitemap_path = dir.path().join("sitemap.xml");
    write_sitemap(&result.urls, &sitemap_path).unwrap();

    let xml = std::fs::read_to_string(&sitemap_path).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains(&format!("<loc>{}/</loc>", base)));
    assert!(xml.contains(&format!("<loc>{}/about</loc>", base)));
    assert!(xml.contains(&format!("<loc>{}/shop</loc>", base)));
    assert_eq!(xml.matches("<changefreq>weekly</changefreq>").count(), 3);
    assert_eq!(xml.matches("<priority>0.5</priority>").count(), 3);

    let publishers =
        publishers_from_config(&publish_config, &user_agent, Duration::from_secs(5))
            .await
            .unwrap();
    let reports = publish_all(&publishers, &sitemap_path).await;

    assert_eq!(reports.len(), 1);
    match &reports[0].result {
        Ok(PublishReceipt::Uploaded { location }) => {
            assert_eq!(location, "https://www.example.com/sitemap.xml");
        }
        other => panic!("expected upload receipt, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sitemap_lastmod_is_today() {
    let dir = tempfile::tempdir().unwrap();
    let sitemap_path = dir.path().join("sitemap.xml");
    let urls = vec![sumi_sitemap::url::canonicalize_absolute("https://example.com/").unwrap()];

    write_sitemap(&urls, &sitemap_path).unwrap();

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    let xml = std::fs::read_to_string(&sitemap_path).unwrap();
    assert!(xml.contains(&format!("<lastmod>{}</lastmod>", today)));
}
