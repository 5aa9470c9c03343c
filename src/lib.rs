//! Sumi-Sitemap: a polite same-domain sitemap builder
//!
//! This crate fetches a starting page and recursively discovers same-domain
//! hyperlinks, producing a tree of visited pages up to a bounded depth. It
//! respects robots.txt and caps the number of concurrent outbound fetches.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod server;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Sitemap operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl { url: String, source: UrlError },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("robots.txt unavailable for {origin}: {reason}")]
    RobotsUnavailable { origin: String, reason: String },

    #[error("Failed to parse {what} from {url}: {message}")]
    ParseFailure {
        what: &'static str,
        url: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sumi-Sitemap operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlNode, CrawlReport, Crawler};
pub use state::{SkipReason, TaskOutcome};
pub use url::{normalize_url, resolve_url, same_domain, ScopePolicy};
