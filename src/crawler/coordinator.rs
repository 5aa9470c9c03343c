//! Crawler coordinator - recursive crawl orchestration
//!
//! Every crawl candidate runs as its own tokio task. A task:
//! - Claims its canonical URL in the visited set
//! - Checks depth, cancellation and robots.txt
//! - Fetches the page through the admission gate
//! - Streams links out of the body and spawns one child task per link
//! - Joins its children and returns the node it owns
//!
//! All mutable state lives in a `CrawlContext` created per invocation, so
//! concurrent crawls never share visited sets, robots caches or gates.

use crate::config::Config;
use crate::crawler::extractor::extract_links;
use crate::crawler::fetcher::{build_http_client, AdmissionGate, FetchError, Fetcher, UserAgentPool};
use crate::crawler::CrawlNode;
use crate::output::stats::{CrawlStatistics, StatsRecorder};
use crate::robots::RobotsCache;
use crate::state::{SkipReason, TaskOutcome, VisitedSet};
use crate::url::{normalize_url, ScopePolicy};
use crate::{SumiError, UrlError};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of one crawl invocation
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// The sitemap tree rooted at the canonical start URL
    pub root: CrawlNode,
    pub statistics: CrawlStatistics,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True if the crawl was cancelled and `root` is partial
    pub cancelled: bool,
}

/// One unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: String,
    pub depth: u32,
}

impl CrawlTask {
    pub fn root(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
        }
    }

    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: self.depth + 1,
        }
    }
}

/// Reusable crawler holding the HTTP client and identity pool
///
/// Each call to `crawl` or `crawl_with_cancel` is an independent invocation.
#[derive(Debug, Clone)]
pub struct Crawler {
    config: Arc<Config>,
    client: Client,
    agents: UserAgentPool,
}

impl Crawler {
    /// Creates a crawler from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(SumiError::Http)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, SumiError> {
        let client = build_http_client(&config.crawler)?;
        let agents = UserAgentPool::from(&config.user_agent);
        tracing::debug!(agents = agents.len(), "identity pool ready");

        Ok(Self {
            config: Arc::new(config),
            client,
            agents,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawls from `start_url` and returns the sitemap tree
    pub async fn crawl(&self, start_url: &str, max_depth: u32) -> Result<CrawlNode, SumiError> {
        let report = self
            .crawl_with_cancel(start_url, max_depth, CancellationToken::new())
            .await?;
        Ok(report.root)
    }

    /// Crawls from `start_url` until done or until `cancel` fires
    ///
    /// A cancelled crawl still returns the tree assembled so far, with
    /// `cancelled` set on the report. The only error is an invalid start URL.
    pub async fn crawl_with_cancel(
        &self,
        start_url: &str,
        max_depth: u32,
        cancel: CancellationToken,
    ) -> Result<CrawlReport, SumiError> {
        let invalid = |source: UrlError| SumiError::InvalidUrl {
            url: start_url.to_string(),
            source,
        };

        let canonical = normalize_url(start_url).map_err(invalid)?;
        let root = Url::parse(&canonical).map_err(|e| invalid(UrlError::Parse(e.to_string())))?;

        let started_at = Utc::now();
        let timer = Instant::now();

        let gate = AdmissionGate::new(self.config.crawler.max_concurrent_fetches as usize);
        let fetcher = Fetcher::new(self.client.clone(), gate.clone());

        let ctx = Arc::new(CrawlContext {
            root,
            max_depth,
            scope: self.config.crawler.scope,
            visited: VisitedSet::new(),
            robots: RobotsCache::new(fetcher.clone()),
            fetcher,
            agents: self.agents.clone(),
            cancel: cancel.clone(),
            stats: StatsRecorder::new(),
        });

        tracing::info!(url = %canonical, max_depth, "crawl started");

        let root_node = match crawl_task(Arc::clone(&ctx), CrawlTask::root(canonical.clone())).await {
            TaskOutcome::Joined(node) => node,
            TaskOutcome::Skipped(reason) => {
                tracing::info!(url = %canonical, reason = %reason, "start page produced no tree");
                CrawlNode::new(canonical)
            }
        };

        let statistics =
            ctx.stats
                .snapshot(gate.peak(), gate.capacity(), ctx.robots.len(), timer.elapsed());
        let cancelled = cancel.is_cancelled();

        tracing::info!(
            pages = statistics.pages_crawled,
            nodes = root_node.len(),
            cancelled,
            "crawl finished in {:?}",
            timer.elapsed()
        );

        Ok(CrawlReport {
            root: root_node,
            statistics,
            started_at,
            finished_at: Utc::now(),
            cancelled,
        })
    }
}

/// Crawls `start_url` with the default configuration
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), sumi_sitemap::SumiError> {
/// let tree = sumi_sitemap::crawl("https://example.com", 2).await?;
/// println!("{} pages", tree.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(start_url: &str, max_depth: u32) -> Result<CrawlNode, SumiError> {
    Crawler::new(Config::default())?
        .crawl(start_url, max_depth)
        .await
}

/// State shared by every task of one invocation
#[derive(Debug)]
struct CrawlContext {
    root: Url,
    max_depth: u32,
    scope: ScopePolicy,
    visited: VisitedSet,
    robots: RobotsCache,
    fetcher: Fetcher,
    agents: UserAgentPool,
    cancel: CancellationToken,
    stats: StatsRecorder,
}

impl CrawlContext {
    fn skip(&self, url: &str, depth: u32, reason: SkipReason) -> TaskOutcome {
        tracing::debug!(url = %url, depth, "skipped:{}", reason);
        self.stats.record_skip(reason);
        TaskOutcome::Skipped(reason)
    }
}

/// Boxed so tasks can spawn tasks of the same type
fn crawl_task(ctx: Arc<CrawlContext>, task: CrawlTask) -> BoxFuture<'static, TaskOutcome> {
    async move { run_task(ctx, task).await }.boxed()
}

async fn run_task(ctx: Arc<CrawlContext>, task: CrawlTask) -> TaskOutcome {
    let depth = task.depth;

    let canonical = match normalize_url(&task.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(url = %task.url, error = %e, "invalid task URL");
            return ctx.skip(&task.url, depth, SkipReason::InvalidUrl);
        }
    };

    if !ctx.visited.insert(&canonical) {
        return ctx.skip(&canonical, depth, SkipReason::AlreadyVisited);
    }

    if depth > ctx.max_depth {
        return ctx.skip(&canonical, depth, SkipReason::DepthExceeded);
    }

    if ctx.cancel.is_cancelled() {
        return ctx.skip(&canonical, depth, SkipReason::Cancelled);
    }

    let target = match Url::parse(&canonical) {
        Ok(url) => url,
        Err(_) => return ctx.skip(&canonical, depth, SkipReason::InvalidUrl),
    };

    // One identity per page: robots rules are checked for the same agent
    // that is sent with the fetch.
    let user_agent = ctx.agents.pick().to_string();

    if !ctx.robots.allowed(&target, &user_agent, &ctx.cancel).await {
        tracing::info!(url = %canonical, depth, "robots-blocked");
        return ctx.skip(&canonical, depth, SkipReason::RobotsBlocked);
    }

    tracing::info!(url = %canonical, depth, "crawling");

    let page = match ctx.fetcher.fetch(&target, &user_agent, &ctx.cancel).await {
        Ok(page) => page,
        Err(FetchError::Cancelled) => return ctx.skip(&canonical, depth, SkipReason::Cancelled),
        Err(e) => {
            tracing::warn!(url = %canonical, depth, error = %e, "fetch-error");
            return ctx.skip(&canonical, depth, SkipReason::FetchFailed);
        }
    };

    if !page.is_success() {
        let status = page.status().as_u16();
        tracing::warn!(url = %canonical, depth, status, "fetch-error");
        return ctx.skip(&canonical, depth, SkipReason::HttpStatus(status));
    }

    ctx.stats.record_page();
    let mut node = CrawlNode::new(canonical);

    // Leaf: the body is dropped unread, which frees the fetch slot.
    if depth >= ctx.max_depth {
        return TaskOutcome::Joined(node);
    }

    if !page.is_html() {
        tracing::debug!(url = %node.url, depth, "not html, links not followed");
        return TaskOutcome::Joined(node);
    }

    let base = page.url().clone();
    let mut links = extract_links(page, base);
    let mut children = JoinSet::new();

    loop {
        let link = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            next = links.next() => match next {
                Some(link) => link,
                None => break,
            },
        };
        ctx.stats.record_link();

        let candidate = match normalize_url(&link) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %link, error = %e, "dropping link");
                ctx.stats.record_invalid_link();
                continue;
            }
        };

        let in_scope = Url::parse(&candidate)
            .map(|parsed| ctx.scope.in_scope(&ctx.root, &parsed))
            .unwrap_or(false);
        if !in_scope {
            ctx.stats.record_out_of_scope();
            continue;
        }

        // Pre-filter only; the child's own insert decides.
        if ctx.visited.contains(&candidate) {
            continue;
        }

        children.spawn(crawl_task(Arc::clone(&ctx), task.child(candidate)));
    }
    drop(links);

    while let Some(joined) = children.join_next().await {
        match joined {
            Ok(outcome) => node.children.extend(outcome.into_node()),
            Err(e) => tracing::warn!(url = %node.url, error = %e, "crawl task did not complete"),
        }
    }

    TaskOutcome::Joined(node)
}
