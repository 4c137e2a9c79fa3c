use crate::crawler::{CrawlOptions, FollowPolicy};
use crate::rules::{CrawlRule, RuleCondition, RuleScope};
use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Link Scanner
///
/// Every section is optional; command line flags override what is set here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(rename = "rule", default)]
    pub rules: Vec<RuleEntry>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seed URL
    pub url: Option<String>,

    /// Maximum number of external-domain hops
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of concurrent workers
    pub threads: usize,

    /// Pause after each expanded page (milliseconds)
    pub delay: u64,

    /// Timeout of each request (milliseconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    #[serde(rename = "follow-redirects")]
    pub follow_redirects: bool,

    #[serde(rename = "follow-query-strings")]
    pub follow_query_strings: bool,

    #[serde(rename = "internal-links")]
    pub internal_links: FollowPolicy,

    #[serde(rename = "external-links")]
    pub external_links: FollowPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_depth: 1,
            threads: 1,
            delay: 0,
            request_timeout: 10_000,
            follow_redirects: true,
            follow_query_strings: true,
            internal_links: FollowPolicy::Follow,
            external_links: FollowPolicy::Check,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

fn default_crawler_name() -> String {
    "link-scanner".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

/// One `[[rule]]` entry, kept as written until compiled
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleEntry {
    pub condition: RuleCondition,
    #[serde(default)]
    pub scope: RuleScope,
    pub pattern: String,
}

impl RuleEntry {
    pub fn compile(&self) -> Result<CrawlRule, ConfigError> {
        CrawlRule::new(self.condition, self.scope, &self.pattern)
    }
}

impl Config {
    /// Snapshot of the crawl options described by this configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no seed URL is set.
    pub fn crawl_options(&self) -> Result<CrawlOptions, ConfigError> {
        let url = self
            .scan
            .url
            .clone()
            .ok_or_else(|| ConfigError::Validation("no seed URL given".to_string()))?;

        Ok(CrawlOptions {
            url,
            max_depth: self.scan.max_depth,
            threads: self.scan.threads,
            delay: Duration::from_millis(self.scan.delay),
            timeout: Duration::from_millis(self.scan.request_timeout),
            follow_redirects: self.scan.follow_redirects,
            follow_query_strings: self.scan.follow_query_strings,
            external: self.scan.external_links,
            internal: self.scan.internal_links,
        })
    }

    /// Compiles the configured rules, in declaration order
    pub fn crawl_rules(&self) -> Result<Vec<CrawlRule>, ConfigError> {
        self.rules.iter().map(RuleEntry::compile).collect()
    }
}
