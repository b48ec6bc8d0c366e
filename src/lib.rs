//! Recon-Scan: a concurrent web reconnaissance crawler
//!
//! This crate discovers, deduplicates, filters, fetches and classifies URLs
//! across a target site, with one-shot excursions into external domains,
//! while staying inside request and result budgets. Fetched content is
//! scanned for sensitive material and every emitted result lands in a CSV
//! report.

pub mod config;
pub mod crawler;
pub mod output;
pub mod sensitive;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Recon-Scan operations
///
/// Only construction-time failures surface through this type. Per-URL
/// failures are captured in the page result and never abort a run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Recon-Scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{ScanConfig, ScanConfigBuilder, ScopeMode};
pub use crawler::{PageResult, ScanReport, ScanState, Scanner};
pub use url::{domain_matches, registrable_domain, UrlClass, UrlMatcher};
