//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - HEAD requests to check reachability and Content-Type
//! - GET requests to fetch page content
//! - Per-request timeouts and redirect policy

use crate::config::UserAgentConfig;
use crate::FetchError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Content types whose bodies are parsed for links
pub const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Maximum redirect hops when redirects are followed
const MAX_REDIRECTS: usize = 10;

/// Outcome of a HEAD request
#[derive(Debug, Clone)]
pub struct HeadResponse {
    /// URL after any followed redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, if present
    pub content_type: Option<String>,
}

/// Pair of HTTP clients sharing one identity
///
/// reqwest fixes the redirect policy per client, so one client follows
/// redirects and the other reports them as-is. Tasks pick one by their own
/// redirect flag.
#[derive(Debug, Clone)]
pub struct Fetcher {
    following: Client,
    direct: Client,
}

impl Fetcher {
    /// Builds the fetcher's clients
    ///
    /// # Example
    ///
    /// ```no_run
    /// use link_scanner::config::UserAgentConfig;
    /// use link_scanner::crawler::Fetcher;
    ///
    /// let fetcher = Fetcher::new(&UserAgentConfig::default()).unwrap();
    /// ```
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let user_agent = build_user_agent(config);

        let following = Client::builder()
            .user_agent(user_agent.clone())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;

        let direct = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { following, direct })
    }

    fn client(&self, follow_redirects: bool) -> &Client {
        if follow_redirects {
            &self.following
        } else {
            &self.direct
        }
    }

    /// Sends a HEAD request
    ///
    /// Any HTTP status is a successful response here; only network-level
    /// failures are errors.
    pub async fn head(
        &self,
        url: &Url,
        timeout: Duration,
        follow_redirects: bool,
    ) -> Result<HeadResponse, FetchError> {
        let response = self
            .client(follow_redirects)
            .head(url.clone())
            .timeout(timeout)
            .send()
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string());

        Ok(HeadResponse {
            final_url: response.url().clone(),
            status: response.status().as_u16(),
            content_type,
        })
    }

    /// Sends a GET request and returns the decoded body
    pub async fn get_text(
        &self,
        url: &Url,
        timeout: Duration,
        follow_redirects: bool,
    ) -> Result<String, FetchError> {
        let response = self
            .client(follow_redirects)
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await?;

        Ok(response.text().await?)
    }
}

/// Formats the User-Agent header
///
/// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
pub fn build_user_agent(config: &UserAgentConfig) -> String {
    match &config.contact_url {
        Some(contact) => format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, contact
        ),
        None => format!("{}/{}", config.crawler_name, config.crawler_version),
    }
}

/// Returns true if a Content-Type value denotes an HTML document
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.trim().to_ascii_lowercase();
    HTML_CONTENT_TYPES
        .iter()
        .any(|accepted| content_type.starts_with(accepted))
}
