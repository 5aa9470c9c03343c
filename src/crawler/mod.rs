//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Gated HTTP fetching with rotating identities
//! - Streaming link extraction
//! - Recursive crawl coordination and the sitemap tree

mod coordinator;
mod extractor;
mod fetcher;
mod node;

pub use coordinator::{crawl, CrawlReport, CrawlTask, Crawler};
pub use extractor::{extract_links, extract_links_from_html, LinkStream};
pub use fetcher::{
    build_http_client, AdmissionGate, FetchError, FetchSlot, FetchedPage, Fetcher, UserAgentPool,
};
pub use node::CrawlNode;
