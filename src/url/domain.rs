use url::Url;

/// Extracts the domain (network location) from a URL
///
/// The domain is the lowercase host followed by the port when the URL carries
/// an explicit non-default one. Two links belong to the same site only if
/// their domains are equal, so `example.com` and `example.com:8080` are
/// different sites.
///
/// # Returns
///
/// * `Some(String)` - The domain
/// * `None` - If the URL has no host (e.g. `mailto:` links)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use link_scanner::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns true if the URL's domain equals `domain`
pub fn is_same_domain(url: &Url, domain: &str) -> bool {
    extract_domain(url).as_deref() == Some(domain)
}
