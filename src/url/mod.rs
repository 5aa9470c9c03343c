//! URL handling module for Sumi-Sitemap
//!
//! This module provides canonicalization (the crawl's deduplication key),
//! relative link resolution, and the same-domain scope filter.

mod normalize;
mod resolve;
mod scope;

pub use normalize::normalize_url;
pub(crate) use resolve::resolve_against;
pub use resolve::resolve_url;
pub use scope::{extract_domain, same_domain, ScopePolicy};
