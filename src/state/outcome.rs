/// Task outcome definitions for the crawl state machine
///
/// A task moves through Pending, Admitted (fetching), Extracting, Expanding
/// and Joined. It ends either Joined with a node, or Skipped with a reason.
use crate::crawler::CrawlNode;
use std::fmt;

/// Why a crawl task contributed nothing to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The task URL could not be canonicalized
    InvalidUrl,

    /// Another task already claimed this canonical URL
    AlreadyVisited,

    /// The task depth is past the invocation's maximum depth
    DepthExceeded,

    /// robots.txt disallows the URL for the identity in use
    RobotsBlocked,

    /// Network error or timeout
    FetchFailed,

    /// Response arrived with a non-2xx status
    HttpStatus(u16),

    /// The invocation was cancelled before the task finished
    Cancelled,
}

impl SkipReason {
    /// Returns true if the skip was caused by a failure rather than policy
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::HttpStatus(_))
    }

    /// Stable label used in log events and statistics
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::AlreadyVisited => "already_visited",
            Self::DepthExceeded => "depth_exceeded",
            Self::RobotsBlocked => "robots_blocked",
            Self::FetchFailed => "fetch_failed",
            Self::HttpStatus(_) => "http_status",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(code) => write!(f, "http_status({})", code),
            other => f.write_str(other.label()),
        }
    }
}

/// Terminal outcome of one crawl task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The page was fetched; the node holds its joined children
    Joined(CrawlNode),

    /// The task produced nothing for its parent
    Skipped(SkipReason),
}

impl TaskOutcome {
    pub fn into_node(self) -> Option<CrawlNode> {
        match self {
            Self::Joined(node) => Some(node),
            Self::Skipped(_) => None,
        }
    }
}
