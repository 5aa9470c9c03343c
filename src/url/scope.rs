use serde::{Deserialize, Serialize};
use url::Url;

/// Decides which discovered links belong to the crawl
///
/// `Host` compares hostnames only, so `http://x` and `https://x:8443` are the
/// same site. `Origin` additionally requires scheme and port to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopePolicy {
    #[default]
    Host,
    Origin,
}

impl ScopePolicy {
    /// Returns true if `candidate` is inside the crawl scope rooted at `base`
    pub fn in_scope(&self, base: &Url, candidate: &Url) -> bool {
        match self {
            Self::Host => match (extract_domain(base), extract_domain(candidate)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            Self::Origin => base.origin().is_tuple() && base.origin() == candidate.origin(),
        }
    }
}

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_sitemap::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs share a hostname
///
/// Scheme and port are ignored. A URL that fails to parse is out of scope.
pub fn same_domain(base: &str, candidate: &str) -> bool {
    match (Url::parse(base), Url::parse(candidate)) {
        (Ok(base), Ok(candidate)) => ScopePolicy::Host.in_scope(&base, &candidate),
        _ => false,
    }
}
