//! The per-link unit of work

use crate::crawler::fetcher::{is_html_content_type, Fetcher};
use crate::crawler::parser::extract_links;
use crate::crawler::Origin;
use crate::FetchError;
use std::time::Duration;
use url::Url;

/// One link's fetch-and-extract task
///
/// Created by the orchestrator, executed exactly once by a worker, then
/// handed back to the orchestrator and discarded.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// The requested link (fragment-free)
    pub link: Url,
    /// The page the link was found on; None for the seed
    pub source: Option<Url>,
    /// Number of external-domain hops from the seed
    pub depth: u32,
    /// Timeout of each request made by this task
    pub timeout: Duration,
    /// Whether redirects are followed
    pub redirect: bool,
    /// Where the link lives relative to the crawl's domain
    pub origin: Origin,
    /// Whether the content is fetched and scanned for further links
    pub follow: bool,
    /// Outbound links found in the content
    pub links: Vec<Url>,
    /// Final URL after redirects, once a response was received
    pub final_url: Option<Url>,
    /// HTTP status of the HEAD response; 0 until a response was received
    pub status: u16,
    /// Network error, if the task failed
    pub error: Option<FetchError>,
    /// Whether the final URL differs from the requested one
    pub redirected: bool,
}

impl CrawlTask {
    /// Creates an unexecuted task
    pub fn new(
        link: Url,
        source: Option<Url>,
        depth: u32,
        origin: Origin,
        follow: bool,
        timeout: Duration,
        redirect: bool,
    ) -> Self {
        Self {
            link,
            source,
            depth,
            timeout,
            redirect,
            origin,
            follow,
            links: Vec::new(),
            final_url: None,
            status: 0,
            error: None,
            redirected: false,
        }
    }

    /// Creates the first task of a crawl
    pub fn seed(link: Url, timeout: Duration, redirect: bool) -> Self {
        Self::new(link, None, 0, Origin::Internal, true, timeout, redirect)
    }

    /// The URL the content was actually served from
    pub fn effective_url(&self) -> &Url {
        self.final_url.as_ref().unwrap_or(&self.link)
    }

    /// Executes the task
    ///
    /// Never fails: a network failure is stored in `error` and leaves the
    /// task without outbound links.
    pub async fn run(&mut self, fetcher: &Fetcher) {
        if let Err(e) = self.fetch(fetcher).await {
            tracing::debug!("Fetch failed for {}: {}", self.link, e);
            self.links.clear();
            self.error = Some(e);
        }
    }

    async fn fetch(&mut self, fetcher: &Fetcher) -> Result<(), FetchError> {
        // HEAD first so non-HTML resources are never downloaded
        let head = fetcher.head(&self.link, self.timeout, self.redirect).await?;

        self.status = head.status;
        self.redirected = head.final_url != self.link;
        self.final_url = Some(head.final_url.clone());

        if !self.follow {
            return Ok(());
        }

        if head.status >= 400 {
            return Ok(());
        }

        if !head
            .content_type
            .as_deref()
            .is_some_and(is_html_content_type)
        {
            tracing::trace!(
                "Not parsing {}: content type {:?}",
                head.final_url,
                head.content_type
            );
            return Ok(());
        }

        let body = fetcher
            .get_text(&head.final_url, self.timeout, self.redirect)
            .await?;
        self.links = extract_links(&body, &head.final_url);

        tracing::trace!("Found {} links on {}", self.links.len(), head.final_url);
        Ok(())
    }
}
