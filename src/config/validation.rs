use crate::config::types::{DedupConfig, FilterConfig, PatternEntry, ScanConfig, ScanSettings};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &ScanConfig) -> Result<(), ConfigError> {
    validate_scan_settings(&config.scan)?;
    validate_filters(&config.filters)?;
    validate_dedup(&config.dedup)?;
    validate_sensitive_patterns(&config.sensitive)?;
    Ok(())
}

/// Validates crawl settings
fn validate_scan_settings(settings: &ScanSettings) -> Result<(), ConfigError> {
    let url = Url::parse(&settings.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", settings.start_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Start URL '{}' must use http or https",
            settings.start_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' has no host",
            settings.start_url
        )));
    }

    if settings.workers < 1 || settings.workers > 500 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 500, got {}",
            settings.workers
        )));
    }

    if settings.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if settings.max_requests == Some(0) {
        return Err(ConfigError::Validation(
            "max-requests must be >= 1 when set".to_string(),
        ));
    }

    if settings.max_urls == Some(0) {
        return Err(ConfigError::Validation(
            "max-urls must be >= 1 when set".to_string(),
        ));
    }

    if let Some(proxy) = &settings.proxy {
        let parsed = Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
        if !matches!(parsed.scheme(), "http" | "https" | "socks5" | "socks5h") {
            return Err(ConfigError::Validation(format!(
                "Unsupported proxy scheme '{}'",
                parsed.scheme()
            )));
        }
    }

    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates domain lists, extensions and title regexes
fn validate_filters(filters: &FilterConfig) -> Result<(), ConfigError> {
    for domain in filters.allow_domains.iter().chain(&filters.deny_domains) {
        validate_domain_pattern(domain)?;
    }

    for ext in &filters.deny_extensions {
        if ext.len() < 2 || ext.contains('/') || ext.contains('?') {
            return Err(ConfigError::Validation(format!(
                "Invalid extension '{}'",
                ext
            )));
        }
    }

    for pattern in &filters.title_filters {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid title filter '{}': {}", pattern, e))
        })?;
    }

    Ok(())
}

/// Validates membership filter sizing
fn validate_dedup(dedup: &DedupConfig) -> Result<(), ConfigError> {
    if dedup.expected_urls == 0 {
        return Err(ConfigError::Validation(
            "expected-urls must be >= 1".to_string(),
        ));
    }

    let rate = dedup.false_positive_rate;
    if !(rate > 0.0 && rate < 1.0) {
        return Err(ConfigError::Validation(format!(
            "false-positive-rate must be in (0, 1), got {}",
            rate
        )));
    }

    Ok(())
}

/// Extra patterns need a name; a bad regex is skipped later by the detector
fn validate_sensitive_patterns(patterns: &[PatternEntry]) -> Result<(), ConfigError> {
    for entry in patterns {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Sensitive pattern '{}' needs a name",
                entry.regex
            )));
        }
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
pub(crate) fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)
    } else {
        validate_domain_string(pattern)
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
