//! Result events emitted while a scan is running

use crate::crawler::Origin;
use crate::FetchError;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Why a link was not checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The link has a query string and query strings are not followed
    QueryString,
    /// The scheme is neither http nor https
    UnsupportedScheme,
    /// Internal links are ignored
    InternalIgnored,
    /// External links are ignored
    ExternalIgnored,
    /// The link is more external hops away than allowed
    DepthExceeded,
    /// A user rule rejected the link
    Rule,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::QueryString => "query string",
            Self::UnsupportedScheme => "unsupported scheme",
            Self::InternalIgnored => "internal links ignored",
            Self::ExternalIgnored => "external links ignored",
            Self::DepthExceeded => "depth exceeded",
            Self::Rule => "excluded by rule",
        };
        f.write_str(text)
    }
}

/// Outcome notification for one link, or the end of the scan
///
/// Every unique link reaches exactly one of `Error`, `Skipped` or
/// `Completed`. A scan that runs to completion ends with one `Done`; a
/// stopped scan emits none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResultEvent {
    /// The request timed out or the connection failed
    Error {
        link: Url,
        source: Option<Url>,
        origin: Origin,
        error: FetchError,
    },
    /// The link was excluded by policy or by a rule
    Skipped {
        link: Url,
        source: Option<Url>,
        origin: Origin,
        reason: SkipReason,
    },
    /// A status code was received
    Completed {
        link: Url,
        source: Option<Url>,
        origin: Origin,
        status: u16,
        final_url: Url,
    },
    /// The scan finished
    Done,
}

impl ResultEvent {
    pub fn link(&self) -> Option<&Url> {
        match self {
            Self::Error { link, .. } | Self::Skipped { link, .. } | Self::Completed { link, .. } => {
                Some(link)
            }
            Self::Done => None,
        }
    }

    pub fn source(&self) -> Option<&Url> {
        match self {
            Self::Error { source, .. }
            | Self::Skipped { source, .. }
            | Self::Completed { source, .. } => source.as_ref(),
            Self::Done => None,
        }
    }

    pub fn origin(&self) -> Option<Origin> {
        match self {
            Self::Error { origin, .. }
            | Self::Skipped { origin, .. }
            | Self::Completed { origin, .. } => Some(*origin),
            Self::Done => None,
        }
    }

    /// The HTTP status of a `Completed` event
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Completed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}
