use crate::UrlError;
use url::Url;

/// Normalizes a URL into its canonical string form
///
/// The canonical form is the deduplication key for a crawl.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything but `http` and `https`
/// 3. Remove fragment (everything after #)
/// 4. Remove the query string
/// 5. Remove trailing slashes (including the root slash)
///
/// Host lowercasing and default-port removal come from the URL parser itself.
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM/page/?q=1#top").unwrap();
/// assert_eq!(url, "http://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    url.set_query(None);

    Ok(url.as_str().trim_end_matches('/').to_string())
}
