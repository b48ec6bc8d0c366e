use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Extensions skipped by default: binary assets that never carry links
pub const DEFAULT_DENY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".svg", ".webp", ".tif", ".tiff", ".woff",
    ".woff2", ".ttf", ".eot", ".otf", ".mp3", ".mp4", ".avi", ".mov", ".wav", ".flv", ".webm",
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".7z", ".gz",
    ".tar", ".exe", ".dmg", ".iso", ".apk",
];

/// Keywords marking endpoints that may change server state when visited
pub const DEFAULT_DANGER_SUBSTRINGS: &[&str] = &[
    "delete", "remove", "drop", "destroy", "truncate", "logout", "logoff", "signout", "sign-out",
    "shutdown", "reboot", "restart", "reset", "kill", "uninstall", "disable", "purge", "revoke",
];

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Main configuration structure for a scan
///
/// Built once (from TOML or [`ScanConfigBuilder`](crate::config::ScanConfigBuilder))
/// and shared read-only by every worker for the duration of the run.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub scan: ScanSettings,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub sensitive: Vec<PatternEntry>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScanSettings {
    /// URL the scan is seeded with
    pub start_url: String,

    /// Which domains may be crawled
    #[serde(default)]
    pub scope: ScopeMode,

    /// Maximum recursion depth from the start URL
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of main-queue workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Delay applied before each request (milliseconds)
    #[serde(default)]
    pub delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of results emitted
    #[serde(default)]
    pub max_urls: Option<usize>,

    /// Maximum number of requests issued
    #[serde(default)]
    pub max_requests: Option<usize>,

    /// Proxy URL applied to every request
    #[serde(default)]
    pub proxy: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Verify TLS certificates (off by default, targets often use self-signed certs)
    #[serde(default)]
    pub verify_tls: bool,

    /// How long cleanup waits for the external worker (seconds)
    #[serde(default = "default_external_join_timeout_secs")]
    pub external_join_timeout_secs: u64,

    /// Rebuild the connection pool after this many requests (0 disables)
    #[serde(default)]
    pub pool_reset_interval: usize,
}

/// URL and result filtering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Domains always permitted; overrides the deny list
    #[serde(default)]
    pub allow_domains: Vec<String>,

    #[serde(default)]
    pub deny_domains: Vec<String>,

    /// Path extensions never fetched or reported
    #[serde(default = "default_deny_extensions")]
    pub deny_extensions: Vec<String>,

    /// URLs containing one of these are recorded as dangerous and skipped
    #[serde(default = "default_danger_substrings")]
    pub danger_substrings: Vec<String>,

    /// When non-empty, only matching URLs are persisted to CSV
    #[serde(default)]
    pub allow_substrings: Vec<String>,

    #[serde(default)]
    pub exclude_substrings: Vec<String>,

    /// Regexes matched against page titles; matches are not reported
    #[serde(default)]
    pub title_filters: Vec<String>,

    /// Status codes that are not reported
    #[serde(default)]
    pub status_filters: Vec<u16>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the CSV report; no report file is written when unset
    #[serde(default)]
    pub csv_path: Option<String>,

    /// Print repeated sightings of a URL on the console
    #[serde(default)]
    pub show_duplicates: bool,
}

/// Membership filter sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DedupConfig {
    #[serde(default = "default_expected_urls")]
    pub expected_urls: usize,

    #[serde(default = "default_false_positive_rate")]
    pub false_positive_rate: f64,
}

/// Extra sensitive-content pattern
#[derive(Debug, Clone, Deserialize)]
pub struct PatternEntry {
    pub name: String,
    pub regex: String,
}

/// Policy governing which domains may be crawled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    /// Recurse within the start URL's registrable domain; visit other domains once
    #[default]
    MainDomainOnly,
    /// Recurse within the exact start host; everything else is visited once
    ExternalOnce,
    /// Recurse into every domain
    Unrestricted,
    /// Recurse into the start domain and allow-listed domains; never leave them
    WhitelistOnly,
}

impl ScopeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainDomainOnly => "main-domain-only",
            Self::ExternalOnce => "external-once",
            Self::Unrestricted => "unrestricted",
            Self::WhitelistOnly => "whitelist-only",
        }
    }
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main-domain-only" | "main" | "0" => Ok(Self::MainDomainOnly),
            "external-once" | "external" | "1" => Ok(Self::ExternalOnce),
            "unrestricted" | "all" | "2" => Ok(Self::Unrestricted),
            "whitelist-only" | "whitelist" | "3" => Ok(Self::WhitelistOnly),
            other => Err(format!("unknown scope mode '{}'", other)),
        }
    }
}

impl ScanConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.scan.timeout_secs)
    }

    /// Delay before each request
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.scan.delay_ms)
    }

    /// Bounded wait for the external worker during cleanup
    pub fn external_join_timeout(&self) -> Duration {
        Duration::from_secs(self.scan.external_join_timeout_secs)
    }

    /// Lowercases list entries and gives extensions a leading dot so that
    /// matching never has to care about how the user spelled them
    pub(crate) fn normalize(&mut self) {
        self.scan.start_url = self.scan.start_url.trim().to_string();

        let filters = &mut self.filters;
        lowercase_all(&mut filters.allow_domains);
        lowercase_all(&mut filters.deny_domains);
        lowercase_all(&mut filters.danger_substrings);
        lowercase_all(&mut filters.allow_substrings);
        lowercase_all(&mut filters.exclude_substrings);
        lowercase_all(&mut filters.deny_extensions);

        for ext in filters.deny_extensions.iter_mut() {
            if !ext.starts_with('.') {
                ext.insert(0, '.');
            }
        }
    }
}

fn lowercase_all(values: &mut Vec<String>) {
    for value in values.iter_mut() {
        *value = value.trim().to_lowercase();
    }
    values.retain(|v| !v.is_empty() && v != ".");
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allow_domains: Vec::new(),
            deny_domains: Vec::new(),
            deny_extensions: default_deny_extensions(),
            danger_substrings: default_danger_substrings(),
            allow_substrings: Vec::new(),
            exclude_substrings: Vec::new(),
            title_filters: Vec::new(),
            status_filters: Vec::new(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            expected_urls: default_expected_urls(),
            false_positive_rate: default_false_positive_rate(),
        }
    }
}

impl ScanSettings {
    pub(crate) fn with_start_url(start_url: String) -> Self {
        Self {
            start_url,
            scope: ScopeMode::default(),
            max_depth: default_max_depth(),
            workers: default_workers(),
            delay_ms: 0,
            timeout_secs: default_timeout_secs(),
            max_urls: None,
            max_requests: None,
            proxy: None,
            user_agent: default_user_agent(),
            verify_tls: false,
            external_join_timeout_secs: default_external_join_timeout_secs(),
            pool_reset_interval: 0,
        }
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_workers() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_external_join_timeout_secs() -> u64 {
    10
}

fn default_deny_extensions() -> Vec<String> {
    DEFAULT_DENY_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_danger_substrings() -> Vec<String> {
    DEFAULT_DANGER_SUBSTRINGS.iter().map(|s| s.to_string()).collect()
}

fn default_expected_urls() -> usize {
    1_000_000
}

fn default_false_positive_rate() -> f64 {
    0.001
}
