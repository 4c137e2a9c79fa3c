//! Result view filter
//!
//! Decides which events a consumer displays. Filtering never affects the
//! scan itself or the statistics.

use crate::crawler::{Origin, ResultEvent};
use crate::FetchError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Display category of a result event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    Timeout,
    Skipped,
    Informational,
    Success,
    Redirect,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub const ALL: [StatusClass; 7] = [
        Self::Timeout,
        Self::Skipped,
        Self::Informational,
        Self::Success,
        Self::Redirect,
        Self::ClientError,
        Self::ServerError,
    ];

    /// Class of an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            0..=199 => Self::Informational,
            200..=299 => Self::Success,
            300..=399 => Self::Redirect,
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }

    /// Class of an event; `None` for `Done`
    ///
    /// Network errors of every kind fall in `Timeout`.
    pub fn from_event(event: &ResultEvent) -> Option<Self> {
        match event {
            ResultEvent::Error { .. } => Some(Self::Timeout),
            ResultEvent::Skipped { .. } => Some(Self::Skipped),
            ResultEvent::Completed { status, .. } => Some(Self::from_status(*status)),
            ResultEvent::Done => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Skipped => "skipped",
            Self::Informational => "1xx",
            Self::Success => "2xx",
            Self::Redirect => "3xx",
            Self::ClientError => "4xx",
            Self::ServerError => "5xx",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for StatusClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timeout" | "timeouts" | "error" | "errors" => Ok(Self::Timeout),
            "skipped" => Ok(Self::Skipped),
            "1xx" | "informational" => Ok(Self::Informational),
            "2xx" | "success" => Ok(Self::Success),
            "3xx" | "redirect" | "redirects" => Ok(Self::Redirect),
            "4xx" | "client-error" | "client-errors" => Ok(Self::ClientError),
            "5xx" | "server-error" | "server-errors" => Ok(Self::ServerError),
            other => Err(format!("unknown status class '{}'", other)),
        }
    }
}

/// Which events to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFilter {
    pub classes: BTreeSet<StatusClass>,
    pub show_internal: bool,
    pub show_external: bool,
    /// Substring that the link or its source must contain
    pub search: Option<String>,
}

impl Default for ResultFilter {
    /// Everything except skipped links
    fn default() -> Self {
        Self {
            classes: StatusClass::ALL
                .into_iter()
                .filter(|class| *class != StatusClass::Skipped)
                .collect(),
            show_internal: true,
            show_external: true,
            search: None,
        }
    }
}

impl ResultFilter {
    /// Shows every event
    pub fn all() -> Self {
        Self {
            classes: StatusClass::ALL.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Parses a comma separated class list such as `"4xx,5xx,timeout"`
    ///
    /// `"all"` selects every class.
    pub fn parse_classes(list: &str) -> Result<BTreeSet<StatusClass>, String> {
        if list.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusClass::ALL.into_iter().collect());
        }

        list.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(StatusClass::from_str)
            .collect()
    }

    /// Returns true if `event` should be displayed
    ///
    /// `Done` always matches.
    pub fn matches(&self, event: &ResultEvent) -> bool {
        let Some(class) = StatusClass::from_event(event) else {
            return true;
        };

        if !self.classes.contains(&class) {
            return false;
        }

        match event.origin() {
            Some(Origin::Internal) if !self.show_internal => return false,
            Some(Origin::External) if !self.show_external => return false,
            _ => {}
        }

        match self.search.as_deref() {
            Some(query) if !query.is_empty() => {
                let in_link = event.link().is_some_and(|l| l.as_str().contains(query));
                let in_source = event.source().is_some_and(|s| s.as_str().contains(query));
                in_link || in_source
            }
            _ => true,
        }
    }
}

/// Short label for an event's status column
pub fn status_label(event: &ResultEvent) -> String {
    match event {
        ResultEvent::Error {
            error: FetchError::Timeout,
            ..
        } => "Timeout".to_string(),
        ResultEvent::Error { .. } => "Error".to_string(),
        ResultEvent::Skipped { .. } => "Skipped".to_string(),
        ResultEvent::Completed { status, .. } => {
            match reqwest::StatusCode::from_u16(*status)
                .ok()
                .and_then(|code| code.canonical_reason())
            {
                Some(reason) => format!("{} {}", status, reason),
                None => status.to_string(),
            }
        }
        ResultEvent::Done => "Done".to_string(),
    }
}
