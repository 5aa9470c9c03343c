//! Shared fixtures for the integration tests

use sumi_sitemap::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_AGENT: &str = "TestBot/1.0";

/// Creates a test configuration with a single fixed identity
pub fn create_test_config(max_concurrent_fetches: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrent_fetches = max_concurrent_fetches;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.pool = vec![TEST_AGENT.to_string()];
    config
}

/// An HTML document containing one anchor per href
pub fn html_with_links(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!("<a href=\"{}\">link</a>\n", href))
        .collect();
    format!("<html><body>\n{}</body></html>", anchors)
}

pub fn html_page(hrefs: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(html_with_links(hrefs), "text/html")
}

/// Mounts a page at `route` that must be requested exactly `times` times
pub async fn mount_page(server: &MockServer, route: &str, hrefs: &[&str], times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(hrefs))
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Child URLs of a node, sorted (children arrive in completion order)
pub fn sorted_child_urls(node: &sumi_sitemap::CrawlNode) -> Vec<String> {
    let mut urls: Vec<String> = node.children.iter().map(|c| c.url.clone()).collect();
    urls.sort();
    urls
}
