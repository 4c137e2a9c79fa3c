//! URL handling module for Link Scanner
//!
//! This module provides seed normalization, fragment stripping, scheme
//! classification and domain extraction.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_domain};
pub use normalize::{normalize_seed, strip_fragment};

/// Schemes that are crawled
pub const ACCEPT_SCHEMES: &[&str] = &["http", "https"];

/// Schemes that are dropped without being reported as skipped
pub const IGNORE_SCHEMES: &[&str] = &["mailto", "javascript", "tel", "data"];

/// How a link's scheme should be treated by the crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeClass {
    /// http or https - the link can be fetched
    Accepted,
    /// A scheme that is silently dropped (mailto:, javascript:, ...)
    Ignored,
    /// Any other scheme - reported as skipped
    Unsupported,
}

/// Classifies a URL scheme
///
/// # Examples
///
/// ```
/// use link_scanner::url::{classify_scheme, SchemeClass};
///
/// assert_eq!(classify_scheme("https"), SchemeClass::Accepted);
/// assert_eq!(classify_scheme("mailto"), SchemeClass::Ignored);
/// assert_eq!(classify_scheme("ftp"), SchemeClass::Unsupported);
/// ```
pub fn classify_scheme(scheme: &str) -> SchemeClass {
    if ACCEPT_SCHEMES.contains(&scheme) {
        SchemeClass::Accepted
    } else if IGNORE_SCHEMES.contains(&scheme) {
        SchemeClass::Ignored
    } else {
        SchemeClass::Unsupported
    }
}
