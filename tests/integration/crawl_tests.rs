//! End-to-end crawl tests against mock sites

use crate::common::{create_test_config, html_page, mount_page, sorted_child_urls};
use std::time::{Duration, Instant};
use sumi_sitemap::crawler::Crawler;
use sumi_sitemap::{CrawlNode, ScopePolicy, SkipReason, SumiError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_same_domain_children_only() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/a", "b", "http://other.com/x"], 1).await;
    mount_page(&server, "/a", &[], 1).await;
    mount_page(&server, "/b", &[], 1).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&format!("{}/", base), 1).await.unwrap();

    assert_eq!(tree.url, base);
    assert_eq!(
        sorted_child_urls(&tree),
        vec![format!("{}/a", base), format!("{}/b", base)]
    );
    assert!(tree.children.iter().all(|c| c.children.is_empty()));
}

#[tokio::test]
async fn test_depth_zero_returns_single_node() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/a"], 1).await;
    mount_page(&server, "/a", &[], 0).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&base, 0).await.unwrap();

    assert_eq!(tree, CrawlNode::new(base));
}

#[tokio::test]
async fn test_repeated_href_yields_one_child() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/a", "/a", "/a#section", "/a?ref=nav"], 1).await;
    mount_page(&server, "/a", &[], 1).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&base, 1).await.unwrap();

    assert_eq!(sorted_child_urls(&tree), vec![format!("{}/a", base)]);
}

#[tokio::test]
async fn test_no_page_is_fetched_twice() {
    let server = MockServer::start().await;
    let base = server.uri();

    // A fully connected site, including links back to the root
    mount_page(&server, "/", &["/a", "/b", "/c"], 1).await;
    mount_page(&server, "/a", &["/", "/b", "/c"], 1).await;
    mount_page(&server, "/b", &["/", "/a", "/c"], 1).await;
    mount_page(&server, "/c", &["/", "/a", "/b/"], 1).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&base, 5).await.unwrap();

    let mut urls = tree.urls();
    assert_eq!(urls.len(), 4);
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 4, "every page appears exactly once in the tree");
}

#[tokio::test]
async fn test_depth_bound_is_respected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/1"], 1).await;
    mount_page(&server, "/1", &["/2"], 1).await;
    mount_page(&server, "/2", &["/3"], 1).await;
    mount_page(&server, "/3", &["/4"], 0).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&base, 2).await.unwrap();

    assert_eq!(tree.depth(), 2);
    assert_eq!(tree.len(), 3);
    let leaf = &tree.children[0].children[0];
    assert_eq!(leaf.url, format!("{}/2", base));
    assert!(leaf.children.is_empty());
}

#[tokio::test]
async fn test_error_status_excludes_branch() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/ok", "/missing", "/broken"], 1).await;
    mount_page(&server, "/ok", &[], 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let report = crawler
        .crawl_with_cancel(&base, 1, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sorted_child_urls(&report.root), vec![format!("{}/ok", base)]);
    assert_eq!(report.statistics.http_statuses.get(&404), Some(&1));
    assert_eq!(report.statistics.http_statuses.get(&500), Some(&1));
    assert_eq!(report.statistics.pages_crawled, 2);
}

#[tokio::test]
async fn test_unreachable_start_returns_single_node() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&base, 3).await.unwrap();

    assert_eq!(tree, CrawlNode::new(base));
}

#[tokio::test]
async fn test_invalid_start_url_is_rejected() {
    let crawler = Crawler::new(create_test_config(10)).unwrap();

    let result = crawler.crawl("::not a url::", 2).await;
    assert!(matches!(result, Err(SumiError::InvalidUrl { .. })));

    let result = crawler.crawl("mailto:someone@example.com", 2).await;
    assert!(matches!(result, Err(SumiError::InvalidUrl { .. })));
}

#[tokio::test]
async fn test_bounded_concurrency() {
    let server = MockServer::start().await;
    let base = server.uri();

    let hrefs: Vec<String> = (0..30).map(|i| format!("/p{}", i)).collect();
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    mount_page(&server, "/", &href_refs, 1).await;

    for href in &hrefs {
        Mock::given(method("GET"))
            .and(path(href.as_str()))
            .respond_with(html_page(&[]).set_delay(Duration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let crawler = Crawler::new(create_test_config(3)).unwrap();
    let report = crawler
        .crawl_with_cancel(&base, 1, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.root.children.len(), 30);
    // 30 slow pages keep the gate saturated: fetches overlap, but never past K.
    assert_eq!(report.statistics.peak_in_flight, 3);
    assert_eq!(report.statistics.max_concurrent_fetches, 3);
}

#[tokio::test]
async fn test_timeout_skips_branch() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/slow", "/fast"], 1).await;
    mount_page(&server, "/fast", &[], 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page(&["/never"]).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = create_test_config(10);
    config.crawler.request_timeout_secs = 1;
    let crawler = Crawler::new(config).unwrap();

    let report = crawler
        .crawl_with_cancel(&base, 2, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sorted_child_urls(&report.root), vec![format!("{}/fast", base)]);
    assert_eq!(report.statistics.skipped(SkipReason::FetchFailed), 1);
}

#[tokio::test]
async fn test_non_html_page_is_a_leaf() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/report.pdf", "/a"], 1).await;
    mount_page(&server, "/a", &[], 1).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/hidden">inside a pdf</a>"#, "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/hidden", &[], 0).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&base, 3).await.unwrap();

    assert_eq!(
        sorted_child_urls(&tree),
        vec![format!("{}/a", base), format!("{}/report.pdf", base)]
    );
    let pdf = tree.child(&format!("{}/report.pdf", base)).unwrap();
    assert!(pdf.children.is_empty());
}

#[tokio::test]
async fn test_pre_cancelled_crawl_fetches_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/a"], 0).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let report = crawler.crawl_with_cancel(&base, 2, cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.root, CrawlNode::new(base));
}

#[tokio::test]
async fn test_cancel_mid_crawl_returns_partial_tree() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/fast", "/slow"], 1).await;
    mount_page(&server, "/fast", &[], 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page(&[]).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let started = Instant::now();
    let report = crawler.crawl_with_cancel(&base, 1, cancel).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(report.cancelled);
    assert_eq!(report.root.url, base);
    assert_eq!(sorted_child_urls(&report.root), vec![format!("{}/fast", base)]);
    assert_eq!(report.statistics.skipped(SkipReason::Cancelled), 1);
}

#[tokio::test]
async fn test_links_resolve_against_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/old"], 1).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/dir/page", base)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/dir/page", &["sibling"], 1).await;
    mount_page(&server, "/dir/sibling", &[], 1).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&base, 2).await.unwrap();

    let old = tree.child(&format!("{}/old", base)).expect("redirected page in tree");
    assert_eq!(sorted_child_urls(old), vec![format!("{}/dir/sibling", base)]);
}

#[tokio::test]
async fn test_host_scope_ignores_port() {
    let site = MockServer::start().await;
    let mirror = MockServer::start().await;
    let base = site.uri();
    let mirror_page = format!("{}/mirrored", mirror.uri());

    mount_page(&site, "/", &[mirror_page.as_str()], 1).await;
    mount_page(&mirror, "/mirrored", &[], 1).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let tree = crawler.crawl(&base, 1).await.unwrap();

    assert_eq!(sorted_child_urls(&tree), vec![mirror_page]);
}

#[tokio::test]
async fn test_origin_scope_requires_same_port() {
    let site = MockServer::start().await;
    let mirror = MockServer::start().await;
    let base = site.uri();
    let mirror_page = format!("{}/mirrored", mirror.uri());

    mount_page(&site, "/", &[mirror_page.as_str(), "/local"], 1).await;
    mount_page(&site, "/local", &[], 1).await;
    mount_page(&mirror, "/mirrored", &[], 0).await;

    let mut config = create_test_config(10);
    config.crawler.scope = ScopePolicy::Origin;
    let crawler = Crawler::new(config).unwrap();

    let report = crawler
        .crawl_with_cancel(&base, 1, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sorted_child_urls(&report.root), vec![format!("{}/local", base)]);
    assert_eq!(report.statistics.links_out_of_scope, 1);
}

#[tokio::test]
async fn test_concurrent_invocations_do_not_share_state() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/a"], 2).await;
    mount_page(&server, "/a", &[], 2).await;

    let crawler = Crawler::new(create_test_config(10)).unwrap();
    let (first, second) = tokio::join!(crawler.crawl(&base, 1), crawler.crawl(&base, 1));

    assert_eq!(first.unwrap().len(), 2);
    assert_eq!(second.unwrap().len(), 2);
}
