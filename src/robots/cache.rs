//! Per-crawl robots.txt cache
//!
//! Each domain's robots.txt is fetched at most once per crawl invocation.
//! Concurrent first queries for the same domain wait on one fetch.

use crate::crawler::Fetcher;
use crate::robots::{fetch_robots, ParsedRobots};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Robots policy gate scoped to one crawl invocation
#[derive(Debug)]
pub struct RobotsCache {
    fetcher: Fetcher,
    entries: Mutex<HashMap<String, Arc<OnceCell<ParsedRobots>>>>,
}

impl RobotsCache {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks `url` against its domain's robots.txt
    ///
    /// The first query for a domain fetches robots.txt. Any failure to get a
    /// usable file is fail-open: the domain is cached as allow-all.
    pub async fn allowed(&self, url: &Url, user_agent: &str, cancel: &CancellationToken) -> bool {
        let origin = url.origin().ascii_serialization();
        let cell = self.cell_for(&origin);

        let robots = cell
            .get_or_init(|| async {
                match fetch_robots(&self.fetcher, &origin, user_agent, cancel).await {
                    Ok(robots) => {
                        tracing::debug!(origin = %origin, "robots.txt loaded");
                        robots
                    }
                    Err(e) => {
                        tracing::warn!(origin = %origin, error = %e, "robots-unavailable: assuming allowed");
                        ParsedRobots::allow_all()
                    }
                }
            })
            .await;

        robots.is_allowed(url.as_str(), user_agent)
    }

    fn cell_for(&self, origin: &str) -> Arc<OnceCell<ParsedRobots>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(origin.to_string()).or_default())
    }

    /// Number of domains with a cached policy
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
