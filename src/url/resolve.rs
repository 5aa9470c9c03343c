use url::{ParseError, Url};

/// Resolves an `href` found on a page into an absolute URL
///
/// An `href` that already parses as an absolute URL is returned verbatim
/// (after trimming surrounding whitespace). Anything else is resolved against
/// `base` using standard relative-reference resolution.
///
/// Returns `None` when either input fails to parse. A malformed link on a
/// page is never an error for the crawl; it is simply skipped.
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::resolve_url;
///
/// assert_eq!(
///     resolve_url("http://example.com/docs/intro", "setup").as_deref(),
///     Some("http://example.com/docs/setup")
/// );
/// assert_eq!(
///     resolve_url("http://example.com/", "https://other.com/x").as_deref(),
///     Some("https://other.com/x")
/// );
/// assert_eq!(resolve_url("not a base", "/page"), None);
/// ```
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    match Url::parse(href) {
        Ok(_) => Some(href.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(base).ok()?;
            join(&base, href)
        }
        Err(e) => {
            tracing::debug!(href, error = %e, "unresolvable href");
            None
        }
    }
}

/// Same as [`resolve_url`], with an already-parsed base
pub(crate) fn resolve_against(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    match Url::parse(href) {
        Ok(_) => Some(href.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => join(base, href),
        Err(e) => {
            tracing::debug!(href, error = %e, "unresolvable href");
            None
        }
    }
}

fn join(base: &Url, href: &str) -> Option<String> {
    match base.join(href) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            tracing::debug!(base = %base, href, error = %e, "failed to resolve href");
            None
        }
    }
}
