//! Output module for rendering crawl results
//!
//! This module handles:
//! - Rendering the sitemap tree as JSON, markdown or plain text
//! - Recording and printing crawl statistics

mod markdown;
pub mod stats;

pub use markdown::format_markdown_sitemap;
pub use stats::{print_statistics, CrawlStatistics, StatsRecorder};

use crate::crawler::CrawlReport;
use clap::ValueEnum;

/// Rendering format for a crawl report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed `{"url", "links"}` tree
    #[default]
    Json,
    /// Nested bullet list with run information
    Markdown,
    /// One URL per line, pre-order
    Text,
}

/// Renders a crawl report
///
/// # Returns
///
/// * `Ok(String)` - The rendered document
/// * `Err(serde_json::Error)` - JSON serialization failed
pub fn render(report: &CrawlReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report.root),
        OutputFormat::Markdown => Ok(format_markdown_sitemap(report)),
        OutputFormat::Text => {
            let mut text = report.root.urls().join("\n");
            text.push('\n');
            Ok(text)
        }
    }
}
