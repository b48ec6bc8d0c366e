use crate::config::types::{
    DedupConfig, FilterConfig, OutputConfig, PatternEntry, ScanConfig, ScanSettings, ScopeMode,
};
use crate::config::validation::validate;
use crate::ConfigError;

/// Resolve-with-defaults builder for [`ScanConfig`]
///
/// Every field starts at the same default the TOML loader would apply.
/// `build` normalizes and validates eagerly, so an invalid domain pattern or
/// title regex is rejected before any request is made.
///
/// # Example
///
/// ```
/// use recon_scan::config::{ScanConfig, ScopeMode};
///
/// let config = ScanConfig::builder("https://example.com/")
///     .scope(ScopeMode::MainDomainOnly)
///     .workers(4)
///     .max_depth(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.scan.workers, 4);
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfig {
    /// Starts a builder seeded with `start_url` and default settings
    pub fn builder(start_url: impl Into<String>) -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: ScanConfig {
                scan: ScanSettings::with_start_url(start_url.into()),
                filters: FilterConfig::default(),
                output: OutputConfig::default(),
                dedup: DedupConfig::default(),
                sensitive: Vec::new(),
            },
        }
    }

    /// Reopens a loaded configuration for overrides
    ///
    /// `build` validates the result again.
    pub fn into_builder(self) -> ScanConfigBuilder {
        ScanConfigBuilder { config: self }
    }
}

impl ScanConfigBuilder {
    /// Replaces the start URL
    pub fn start_url(mut self, start_url: impl Into<String>) -> Self {
        self.config.scan.start_url = start_url.into();
        self
    }

    pub fn scope(mut self, scope: ScopeMode) -> Self {
        self.config.scan.scope = scope;
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.config.scan.max_depth = depth;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.scan.workers = workers;
        self
    }

    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.scan.delay_ms = delay_ms;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.scan.timeout_secs = timeout_secs;
        self
    }

    pub fn max_urls(mut self, max_urls: usize) -> Self {
        self.config.scan.max_urls = Some(max_urls);
        self
    }

    pub fn max_requests(mut self, max_requests: usize) -> Self {
        self.config.scan.max_requests = Some(max_requests);
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.config.scan.proxy = Some(proxy.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.scan.user_agent = user_agent.into();
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config.scan.verify_tls = verify;
        self
    }

    pub fn external_join_timeout_secs(mut self, secs: u64) -> Self {
        self.config.scan.external_join_timeout_secs = secs;
        self
    }

    pub fn pool_reset_interval(mut self, interval: usize) -> Self {
        self.config.scan.pool_reset_interval = interval;
        self
    }

    pub fn allow_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.filters.allow_domains.push(domain.into());
        self
    }

    pub fn deny_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.filters.deny_domains.push(domain.into());
        self
    }

    /// Replaces the default extension deny list
    pub fn deny_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.filters.deny_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the default danger keyword list
    pub fn danger_substrings<I, S>(mut self, substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.filters.danger_substrings = substrings.into_iter().map(Into::into).collect();
        self
    }

    pub fn allow_substring(mut self, substring: impl Into<String>) -> Self {
        self.config.filters.allow_substrings.push(substring.into());
        self
    }

    pub fn exclude_substring(mut self, substring: impl Into<String>) -> Self {
        self.config.filters.exclude_substrings.push(substring.into());
        self
    }

    pub fn title_filter(mut self, regex: impl Into<String>) -> Self {
        self.config.filters.title_filters.push(regex.into());
        self
    }

    pub fn status_filter(mut self, status: u16) -> Self {
        self.config.filters.status_filters.push(status);
        self
    }

    pub fn csv_path(mut self, path: impl Into<String>) -> Self {
        self.config.output.csv_path = Some(path.into());
        self
    }

    pub fn show_duplicates(mut self, show: bool) -> Self {
        self.config.output.show_duplicates = show;
        self
    }

    pub fn expected_urls(mut self, expected: usize) -> Self {
        self.config.dedup.expected_urls = expected;
        self
    }

    pub fn false_positive_rate(mut self, rate: f64) -> Self {
        self.config.dedup.false_positive_rate = rate;
        self
    }

    pub fn sensitive_pattern(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
        self.config.sensitive.push(PatternEntry {
            name: name.into(),
            regex: regex.into(),
        });
        self
    }

    /// Normalizes and validates the configuration
    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        let mut config = self.config;
        config.normalize();
        validate(&config)?;
        Ok(config)
    }
}
