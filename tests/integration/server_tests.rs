//! HTTP endpoint tests against a mock site

use crate::common::{create_test_config, mount_page};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use sumi_sitemap::crawler::Crawler;
use sumi_sitemap::server::router;
use sumi_sitemap::CrawlNode;
use tower::ServiceExt;
use wiremock::MockServer;

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn encode(url: &str) -> String {
    url::form_urlencoded::byte_serialize(url.as_bytes()).collect()
}

#[tokio::test]
async fn test_crawl_endpoint_returns_tree() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(&site, "/", &["/a", "https://elsewhere.example/"], 1).await;
    mount_page(&site, "/a", &["/b"], 1).await;
    mount_page(&site, "/b", &[], 0).await;

    let app = router(Crawler::new(create_test_config(10)).unwrap(), 1);
    let (status, body) = get(app, &format!("/crawl?url={}", encode(&base))).await;

    assert_eq!(status, StatusCode::OK);
    let tree: CrawlNode = serde_json::from_str(&body).unwrap();
    assert_eq!(tree.url, base);
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].url, format!("{}/a", base));

    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(value["links"].is_array());
}

#[tokio::test]
async fn test_index_lists_crawled_urls() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(&site, "/", &["/a"], 1).await;
    mount_page(&site, "/a", &[], 1).await;

    let app = router(Crawler::new(create_test_config(10)).unwrap(), 1);
    let (status, body) = get(app, &format!("/?url={}", encode(&base))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Crawled URLs"));
    assert!(body.contains(&format!("{}\n", base)));
    assert!(body.contains(&format!("{}/a\n", base)));
}

#[tokio::test]
async fn test_missing_url_parameter() {
    let app = router(Crawler::new(create_test_config(10)).unwrap(), 1);
    let (status, body) = get(app, "/crawl").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "url parameter is required");
}
