//! User-defined include/exclude rules
//!
//! Rules are evaluated after the built-in policy checks. Each rule carries a
//! regular expression that is searched for (not anchored) in the raw link.

mod filter;

pub use filter::RuleSet;

use crate::crawler::Origin;
use crate::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a matching rule means for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCondition {
    /// Links must match the pattern
    Include,
    /// Links must not match the pattern
    Exclude,
}

/// Which links a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    #[default]
    Any,
    Internal,
    External,
}

impl RuleScope {
    /// Returns true if a rule with this scope applies to links of `origin`
    pub fn applies_to(&self, origin: Origin) -> bool {
        match self {
            Self::Any => true,
            Self::Internal => origin == Origin::Internal,
            Self::External => origin == Origin::External,
        }
    }
}

/// A compiled include/exclude rule
#[derive(Debug, Clone)]
pub struct CrawlRule {
    pub condition: RuleCondition,
    pub scope: RuleScope,
    pub pattern: Regex,
}

impl CrawlRule {
    /// Compiles a rule
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlRule)` - The compiled rule
    /// * `Err(ConfigError::InvalidPattern)` - The pattern is not a valid regular expression
    ///
    /// # Example
    ///
    /// ```
    /// use link_scanner::rules::{CrawlRule, RuleCondition, RuleScope};
    ///
    /// let rule = CrawlRule::new(RuleCondition::Exclude, RuleScope::Any, r"\.pdf$").unwrap();
    /// assert!(rule.pattern.is_match("https://example.com/file.pdf"));
    /// ```
    pub fn new(
        condition: RuleCondition,
        scope: RuleScope,
        pattern: &str,
    ) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            condition,
            scope,
            pattern,
        })
    }

    /// Shorthand for an `Include` rule
    pub fn include(scope: RuleScope, pattern: &str) -> Result<Self, ConfigError> {
        Self::new(RuleCondition::Include, scope, pattern)
    }

    /// Shorthand for an `Exclude` rule
    pub fn exclude(scope: RuleScope, pattern: &str) -> Result<Self, ConfigError> {
        Self::new(RuleCondition::Exclude, scope, pattern)
    }

    /// Returns true if this rule rejects `link`
    ///
    /// Scope is not considered here; see [`RuleSet::is_rejected`].
    pub fn rejects(&self, link: &str) -> bool {
        let matched = self.pattern.is_match(link);
        match self.condition {
            RuleCondition::Include => !matched,
            RuleCondition::Exclude => matched,
        }
    }
}

impl fmt::Display for CrawlRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let condition = match self.condition {
            RuleCondition::Include => "include",
            RuleCondition::Exclude => "exclude",
        };
        let scope = match self.scope {
            RuleScope::Any => "any",
            RuleScope::Internal => "internal",
            RuleScope::External => "external",
        };
        write!(f, "{} {} /{}/", condition, scope, self.pattern.as_str())
    }
}
