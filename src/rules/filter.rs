use super::CrawlRule;
use crate::crawler::Origin;

/// An ordered, immutable list of rules
///
/// Evaluation walks the rules in declaration order and stops at the first
/// applicable rule that rejects the link. Rules never combine or vote.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CrawlRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<CrawlRule>) -> Self {
        Self { rules }
    }

    /// Returns true if any rule in scope for `origin` rejects `link`
    ///
    /// # Example
    ///
    /// ```
    /// use link_scanner::crawler::Origin;
    /// use link_scanner::rules::{CrawlRule, RuleScope, RuleSet};
    ///
    /// let rules = RuleSet::new(vec![CrawlRule::exclude(RuleScope::External, "tracker").unwrap()]);
    /// assert!(rules.is_rejected("https://tracker.example/", Origin::External));
    /// assert!(!rules.is_rejected("https://tracker.example/", Origin::Internal));
    /// ```
    pub fn is_rejected(&self, link: &str, origin: Origin) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.scope.applies_to(origin))
            .any(|rule| rule.rejects(link))
    }
}
