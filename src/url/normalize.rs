use crate::UrlError;
use url::Url;

/// Normalizes the seed URL of a crawl
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Assume `https://` when no scheme is given
/// 3. Parse the URL; reject if malformed
/// 4. Require an http or https scheme and a host
/// 5. Remove the fragment
///
/// # Examples
///
/// ```
/// use link_scanner::url::normalize_seed;
///
/// let url = normalize_seed("example.com/docs#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_seed(seed: &str) -> Result<Url, UrlError> {
    let seed = seed.trim();
    if seed.is_empty() {
        return Err(UrlError::Parse("seed URL is empty".to_string()));
    }

    let mut url = match Url::parse(seed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", seed))
            .map_err(|e| UrlError::Parse(e.to_string()))?,
        Err(e) => return Err(UrlError::Parse(e.to_string())),
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Removes the fragment from a link
///
/// Links that differ only by fragment name the same resource.
pub fn strip_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}
