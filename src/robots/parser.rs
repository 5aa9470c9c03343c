//! Robots.txt rule evaluation
//!
//! Rules are matched with the robotstxt crate (a port of Google's matcher).
//! Only basic allow/disallow matching is used.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data for one domain
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
    /// True when robots.txt was unavailable and everything is allowed
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used as the default when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// True if this policy came from a fail-open fallback
    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL or path to check (e.g., "https://example.com/page" or "/page")
    /// * `user_agent` - The identity string sent with the page request
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url)
    }
}

/// Reduces a full identity string to the token robots.txt groups are keyed by
///
/// `Mozilla/5.0 (X11; Linux)` becomes `Mozilla`. The matcher compares tokens
/// made of letters, `-` and `_` only.
fn product_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(trimmed.len());
    if end == 0 {
        trimmed
    } else {
        &trimmed[..end]
    }
}
