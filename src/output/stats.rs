//! Crawl statistics
//!
//! Counters are recorded lock-free while a crawl runs and frozen into a
//! `CrawlStatistics` snapshot when the root task has been assembled.

use crate::state::SkipReason;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStatistics {
    /// Pages fetched with a 2xx status
    pub pages_crawled: u64,

    /// Skipped tasks by skip reason label
    pub skipped: BTreeMap<String, u64>,

    /// Non-2xx responses by status code
    pub http_statuses: BTreeMap<u16, u64>,

    /// Links yielded by the extractor
    pub links_discovered: u64,

    /// Links dropped by the scope filter
    pub links_out_of_scope: u64,

    /// Links that could not be canonicalized
    pub invalid_links: u64,

    /// Domains whose robots policy was consulted
    pub robots_domains: usize,

    /// Highest number of simultaneous in-flight fetches
    pub peak_in_flight: usize,

    /// Admission gate capacity of the crawl
    pub max_concurrent_fetches: usize,

    /// Wall-clock duration of the crawl in milliseconds
    pub duration_ms: u64,
}

impl CrawlStatistics {
    /// Count of tasks skipped for `reason`
    ///
    /// All `HttpStatus` skips share one count regardless of code.
    pub fn skipped(&self, reason: SkipReason) -> u64 {
        self.skipped.get(reason.label()).copied().unwrap_or(0)
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// Skips caused by fetch failures or error statuses
    pub fn total_errors(&self) -> u64 {
        self.skipped(SkipReason::FetchFailed) + self.skipped(SkipReason::HttpStatus(0))
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Shared counters written by every task of one crawl
#[derive(Debug, Default)]
pub struct StatsRecorder {
    pages_crawled: AtomicU64,
    links_discovered: AtomicU64,
    links_out_of_scope: AtomicU64,
    invalid_links: AtomicU64,
    skipped: Mutex<BTreeMap<&'static str, u64>>,
    http_statuses: Mutex<BTreeMap<u16, u64>>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page(&self) {
        self.pages_crawled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link(&self) {
        self.links_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_out_of_scope(&self) {
        self.links_out_of_scope.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_link(&self) {
        self.invalid_links.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self, reason: SkipReason) {
        *self
            .skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(reason.label())
            .or_insert(0) += 1;

        if let SkipReason::HttpStatus(code) = reason {
            *self
                .http_statuses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(code)
                .or_insert(0) += 1;
        }
    }

    /// Freezes the counters, adding the crawl-level figures
    pub fn snapshot(
        &self,
        peak_in_flight: usize,
        max_concurrent_fetches: usize,
        robots_domains: usize,
        elapsed: Duration,
    ) -> CrawlStatistics {
        let skipped = self
            .skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(label, count)| (label.to_string(), *count))
            .collect();

        let http_statuses = self
            .http_statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        CrawlStatistics {
            pages_crawled: self.pages_crawled.load(Ordering::Relaxed),
            skipped,
            http_statuses,
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            links_out_of_scope: self.links_out_of_scope.load(Ordering::Relaxed),
            invalid_links: self.invalid_links.load(Ordering::Relaxed),
            robots_domains,
            peak_in_flight,
            max_concurrent_fetches,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// Stdout is reserved for the rendered tree.
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    eprintln!("=== Crawl Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Pages crawled: {}", stats.pages_crawled);
    eprintln!("  Links discovered: {}", stats.links_discovered);
    eprintln!("  Links out of scope: {}", stats.links_out_of_scope);
    eprintln!("  Invalid links: {}", stats.invalid_links);
    eprintln!("  Domains checked for robots.txt: {}", stats.robots_domains);
    eprintln!(
        "  Peak in-flight fetches: {} / {}",
        stats.peak_in_flight, stats.max_concurrent_fetches
    );
    eprintln!("  Duration: {:.2}s", stats.duration().as_secs_f64());
    eprintln!();

    if !stats.skipped.is_empty() {
        eprintln!("Skipped Tasks:");
        // Sort reasons by count (descending)
        let mut counts: Vec<_> = stats.skipped.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in counts {
            eprintln!("  {}: {}", reason, count);
        }
        eprintln!();
    }

    if !stats.http_statuses.is_empty() {
        eprintln!("HTTP Status Summary:");
        for (code, count) in &stats.http_statuses {
            eprintln!("  {}: {}", code, count);
        }
        eprintln!();
    }

    let attempted = stats.pages_crawled + stats.total_errors();
    let success_rate = if attempted > 0 {
        (stats.pages_crawled as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    eprintln!(
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        success_rate, stats.pages_crawled, attempted
    );
}
