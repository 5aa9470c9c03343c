//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! A robots.txt that cannot be fetched or read never blocks a crawl.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use crate::crawler::Fetcher;
use crate::SumiError;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Fetches robots.txt for an origin
///
/// # Arguments
///
/// * `fetcher` - Gated fetcher of the current crawl
/// * `origin` - `scheme://host[:port]` of the domain
/// * `user_agent` - The identity string to send
/// * `cancel` - Crawl cancellation token
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - Successfully fetched and parsed robots.txt
/// * `Err(SumiError::RobotsUnavailable)` - Network failure or non-2xx status
/// * `Err(SumiError::ParseFailure)` - Body is not valid UTF-8
pub async fn fetch_robots(
    fetcher: &Fetcher,
    origin: &str,
    user_agent: &str,
    cancel: &CancellationToken,
) -> Result<ParsedRobots, SumiError> {
    let unavailable = |reason: String| SumiError::RobotsUnavailable {
        origin: origin.to_string(),
        reason,
    };

    let robots_url = Url::parse(&format!("{}/robots.txt", origin))
        .map_err(|e| unavailable(e.to_string()))?;

    tracing::debug!(url = %robots_url, "fetching robots.txt");

    let page = fetcher
        .fetch(&robots_url, user_agent, cancel)
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    if !page.is_success() {
        return Err(unavailable(format!("HTTP {}", page.status().as_u16())));
    }

    let body = page.bytes().await.map_err(|e| unavailable(e.to_string()))?;

    let content = String::from_utf8(body).map_err(|e| SumiError::ParseFailure {
        what: "robots.txt",
        url: robots_url.to_string(),
        message: e.to_string(),
    })?;

    Ok(ParsedRobots::from_content(&content))
}
