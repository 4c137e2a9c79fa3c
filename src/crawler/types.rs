//! Core crawl types shared by the orchestrator, worker pool and consumers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Per-origin link policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowPolicy {
    /// Do not report or fetch the link
    Ignore,
    /// Report reachability without expanding content
    Check,
    /// Report and expand content for further links
    Follow,
}

impl fmt::Display for FollowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ignore => "ignore",
            Self::Check => "check",
            Self::Follow => "follow",
        };
        f.write_str(name)
    }
}

impl FromStr for FollowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "check" => Ok(Self::Check),
            "follow" => Ok(Self::Follow),
            other => Err(format!(
                "unknown link policy '{}', expected ignore, check or follow",
                other
            )),
        }
    }
}

/// Whether a link lives on the crawl's domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Internal,
    External,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => f.write_str("internal"),
            Self::External => f.write_str("external"),
        }
    }
}

/// Seed configuration for one crawl
///
/// A crawl takes this by value; changing the caller's copy afterwards has
/// no effect on a running crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Seed URL
    pub url: String,
    /// Maximum number of external-domain hops
    pub max_depth: u32,
    /// Number of concurrent workers
    pub threads: usize,
    /// Pause after each expanded page
    pub delay: Duration,
    /// Timeout of each HTTP request
    pub timeout: Duration,
    /// Whether HTTP redirects are followed
    pub follow_redirects: bool,
    /// Whether links carrying a query string are crawled
    pub follow_query_strings: bool,
    /// Policy for links on other domains
    pub external: FollowPolicy,
    /// Policy for links on the seed's domain
    pub internal: FollowPolicy,
}

impl CrawlOptions {
    /// Creates options for `url` with the default policy
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// The policy applying to links of the given origin
    pub fn policy_for(&self, origin: Origin) -> FollowPolicy {
        match origin {
            Origin::Internal => self.internal,
            Origin::External => self.external,
        }
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_depth: 1,
            threads: 1,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(10),
            follow_redirects: true,
            follow_query_strings: true,
            external: FollowPolicy::Check,
            internal: FollowPolicy::Follow,
        }
    }
}

/// Lifecycle of a scan
///
/// `Idle -> Running -> (Paused <-> Running) -> Stopped | Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    /// No worker pool exists yet
    Idle,
    /// Workers are fetching and results are being processed
    Running,
    /// Workers finish their current task, then wait; results are held
    Paused,
    /// Halted by the caller; terminal
    Stopped,
    /// Every queued task was processed; terminal
    Done,
}

impl ScanState {
    /// Returns true for `Stopped` and `Done`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Done)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
