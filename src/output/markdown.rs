//! Markdown sitemap generation
//!
//! Renders a crawl report as a nested bullet list followed by run
//! information and statistics.

use crate::crawler::{CrawlNode, CrawlReport};

/// Formats a crawl report as markdown
///
/// # Arguments
///
/// * `report` - The finished (or cancelled) crawl
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_sitemap(report: &CrawlReport) -> String {
    let mut md = String::new();

    // Title
    md.push_str(&format!("# Sitemap of {}\n\n", report.root.url));

    if report.cancelled {
        md.push_str("> Crawl was cancelled; the tree below is partial.\n\n");
    }

    // Tree
    md.push_str("## Pages\n\n");
    push_node(&mut md, &report.root, 0);
    md.push('\n');

    // Run metadata
    let stats = &report.statistics;
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        stats.duration().as_secs_f64()
    ));
    md.push_str(&format!(
        "- **Status**: {}\n\n",
        if report.cancelled { "cancelled" } else { "completed" }
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages in Tree**: {}\n", report.root.len()));
    md.push_str(&format!("- **Tree Depth**: {}\n", report.root.depth()));
    md.push_str(&format!("- **Pages Crawled**: {}\n", stats.pages_crawled));
    md.push_str(&format!("- **Links Discovered**: {}\n", stats.links_discovered));
    md.push_str(&format!(
        "- **Links Out of Scope**: {}\n",
        stats.links_out_of_scope
    ));
    md.push_str(&format!(
        "- **Peak In-Flight Fetches**: {} / {}\n\n",
        stats.peak_in_flight, stats.max_concurrent_fetches
    ));

    if !stats.skipped.is_empty() {
        md.push_str("## Skipped Tasks\n\n");
        md.push_str("| Reason | Count |\n");
        md.push_str("|--------|-------|\n");
        for (reason, count) in &stats.skipped {
            md.push_str(&format!("| {} | {} |\n", reason, count));
        }
        md.push('\n');
    }

    md
}

fn push_node(md: &mut String, node: &CrawlNode, level: usize) {
    md.push_str(&"  ".repeat(level));
    md.push_str(&format!("- <{}>\n", node.url));
    for child in &node.children {
        push_node(md, child, level + 1);
    }
}
