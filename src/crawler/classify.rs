//! Link classification
//!
//! Decides, for every link discovered on a page, whether it becomes a new
//! task, is reported as skipped, or is dropped without a report. The
//! classifier owns the visited set; only the orchestrator's drain loop calls
//! it, so the set needs no locking.

use crate::crawler::events::SkipReason;
use crate::crawler::{CrawlOptions, CrawlTask, FollowPolicy, Origin};
use crate::rules::RuleSet;
use crate::url::{classify_scheme, extract_domain, strip_fragment, SchemeClass};
use std::collections::HashSet;
use url::Url;

/// What to do with a discovered link
#[derive(Debug)]
pub enum Disposition {
    /// Dispatch a new task
    Accept(CrawlTask),
    /// Report the link as skipped
    Skip {
        link: Url,
        origin: Origin,
        reason: SkipReason,
    },
    /// Discard silently (already seen, or an ignored scheme)
    Drop,
}

/// Classifies discovered links against the crawl policy and rules
#[derive(Debug)]
pub struct LinkClassifier {
    options: CrawlOptions,
    domain: String,
    rules: RuleSet,
    visited: HashSet<Url>,
}

impl LinkClassifier {
    /// Creates a classifier whose visited set already contains `seed`
    pub fn new(options: CrawlOptions, domain: String, rules: RuleSet, seed: &Url) -> Self {
        let mut visited = HashSet::new();
        visited.insert(strip_fragment(seed));

        Self {
            options,
            domain,
            rules,
            visited,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Number of distinct links claimed so far, the seed included
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, link: &Url) -> bool {
        self.visited.contains(&strip_fragment(link))
    }

    /// Classifies one link found on `parent`'s page
    ///
    /// The link is claimed in the visited set before any policy check, so a
    /// skipped link is never reported twice.
    pub fn classify(&mut self, parent: &CrawlTask, raw: &Url) -> Disposition {
        let link = strip_fragment(raw);

        if !self.visited.insert(link.clone()) {
            return Disposition::Drop;
        }

        let link_domain = extract_domain(&link);
        let is_internal = link_domain.as_deref() == Some(self.domain.as_str());
        let reported_origin = match link_domain {
            Some(_) if is_internal => Origin::Internal,
            Some(_) => Origin::External,
            None => parent.origin,
        };

        let skip = |reason| Disposition::Skip {
            link: link.clone(),
            origin: reported_origin,
            reason,
        };

        if link.query().is_some_and(|q| !q.is_empty()) && !self.options.follow_query_strings {
            return skip(SkipReason::QueryString);
        }

        match classify_scheme(link.scheme()) {
            SchemeClass::Accepted => {}
            SchemeClass::Ignored => return Disposition::Drop,
            SchemeClass::Unsupported => return skip(SkipReason::UnsupportedScheme),
        }

        let (origin, depth, policy) = if is_internal {
            if self.options.internal == FollowPolicy::Ignore {
                return skip(SkipReason::InternalIgnored);
            }
            (Origin::Internal, parent.depth, self.options.internal)
        } else {
            let depth = parent.depth.saturating_add(1);
            if self.options.external == FollowPolicy::Ignore {
                return skip(SkipReason::ExternalIgnored);
            }
            if depth > self.options.max_depth {
                return skip(SkipReason::DepthExceeded);
            }
            (Origin::External, depth, self.options.external)
        };

        if self.rules.is_rejected(link.as_str(), origin) {
            return skip(SkipReason::Rule);
        }

        Disposition::Accept(CrawlTask::new(
            link.clone(),
            Some(parent.link.clone()),
            depth,
            origin,
            policy == FollowPolicy::Follow,
            self.options.timeout,
            self.options.follow_redirects,
        ))
    }
}
