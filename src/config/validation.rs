use crate::config::types::{Config, RuleEntry, ScanConfig, UserAgentConfig};
use crate::url::normalize_seed;
use crate::ConfigError;
use url::Url;

/// Maximum number of concurrent workers
pub const MAX_THREADS: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scan_config(&config.scan)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_rules(&config.rules)?;
    Ok(())
}

/// Validates crawl behavior configuration
pub(crate) fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.threads < 1 || config.threads > MAX_THREADS {
        return Err(ConfigError::Validation(format!(
            "threads must be between 1 and {}, got {}",
            MAX_THREADS, config.threads
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1ms, got {}ms",
            config.request_timeout
        )));
    }

    if let Some(url) = &config.url {
        normalize_seed(url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", url, e)))?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, token characters only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters, '-', '_' and '.', got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates that every rule pattern compiles
fn validate_rules(rules: &[RuleEntry]) -> Result<(), ConfigError> {
    for rule in rules {
        rule.compile()?;
    }
    Ok(())
}
