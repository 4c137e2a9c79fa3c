//! HTML parser for extracting outbound links
//!
//! Only `<a href>`, `<img src>` and `<link href>` references are collected.
//! The html5ever tree builder behind `scraper` recovers from malformed
//! markup, so a broken document still yields the links it contains.

use scraper::{Html, Selector};
use url::Url;

/// Element selectors and the attribute holding each element's reference
const LINK_SELECTORS: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("img[src]", "src"),
    ("link[href]", "href"),
];

/// Extracts all references from an HTML document
///
/// Each reference is resolved against `base_url`. Links are returned in
/// document order per element kind: anchors first, then images, then
/// `<link>` elements. Scheme filtering and deduplication are left to the
/// caller.
///
/// # Example
///
/// ```
/// use link_scanner::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><img src="logo.png">"#;
/// let base = Url::parse("https://example.com/index.html").unwrap();
/// let links = extract_links(html, &base);
/// assert_eq!(links[0].as_str(), "https://example.com/about");
/// assert_eq!(links[1].as_str(), "https://example.com/logo.png");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for (selector, attribute) in LINK_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };

        for element in document.select(&selector) {
            if let Some(link) = element
                .value()
                .attr(attribute)
                .and_then(|value| resolve_link(value, base_url))
            {
                links.push(link);
            }
        }
    }

    links
}

/// Resolves a reference to an absolute URL
///
/// Returns None for empty references and ones that cannot be resolved.
fn resolve_link(reference: &str, base_url: &Url) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    base_url.join(reference).ok()
}
