//! URL handling for Recon-Scan
//!
//! This module extracts link candidates from fetched content, resolves them
//! against the document they came from, and classifies the results against
//! the scan's scope and safety rules.

mod domain;
mod extract;
mod matcher;
mod normalize;

use crate::config::{ScanConfig, ScopeMode};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, registrable_domain, same_registrable_domain};
pub use extract::{chunk_candidates, extract_candidates};
pub use matcher::{domain_matches, matches_any};
pub use normalize::resolve_candidate;

/// Why a URL was dropped by the admission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionReason {
    /// Not http(s), or no host
    Scheme,
    /// Host is on the deny list and not on the allow list
    DeniedDomain,
    /// Path ends with a denied extension
    Extension,
    /// URL contains an exclude substring
    Pattern,
}

/// Outcome of running a URL through the admission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlClass {
    /// Crawl recursively through the main queue
    Internal,
    /// Visit once through the external queue, never recurse
    External,
    /// Matched a danger keyword; record and never fetch
    Dangerous,
    /// Dropped silently
    Excluded(ExclusionReason),
    /// Outside a whitelist scope; reported as unvisited
    OutOfScope,
}

impl UrlClass {
    /// Returns true if the URL may be fetched
    pub fn is_fetchable(&self) -> bool {
        matches!(self, Self::Internal | Self::External)
    }
}

/// Domain allow/deny lists, where an allow entry overrides a deny entry
#[derive(Debug, Clone, Default)]
pub struct DomainPolicy {
    allow: Vec<String>,
    deny: Vec<String>,
}

impl DomainPolicy {
    pub fn new(allow: Vec<String>, deny: Vec<String>) -> Self {
        Self { allow, deny }
    }

    /// Returns true unless the host is denied and not explicitly allowed
    pub fn permits(&self, host: &str) -> bool {
        matches_any(&self.allow, host) || !matches_any(&self.deny, host)
    }

    /// Returns true if the host is on the allow list
    pub fn is_allowed(&self, host: &str) -> bool {
        matches_any(&self.allow, host)
    }
}

/// Extracts, resolves and classifies URLs for one scan
///
/// Built once from the scan configuration and shared by every worker.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    scope: ScopeMode,
    start_host: String,
    start_domain: String,
    policy: DomainPolicy,
    deny_extensions: Vec<String>,
    danger_substrings: Vec<String>,
    exclude_substrings: Vec<String>,
}

impl UrlMatcher {
    /// Creates a matcher anchored at the configured start URL
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` when the start URL has no host.
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        let start = Url::parse(&config.scan.start_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.scan.start_url, e)))?;
        let start_host = extract_domain(&start)
            .ok_or_else(|| ConfigError::InvalidUrl(config.scan.start_url.clone()))?;

        let filters = &config.filters;
        Ok(Self {
            scope: config.scan.scope,
            start_domain: registrable_domain(&start_host),
            start_host,
            policy: DomainPolicy::new(filters.allow_domains.clone(), filters.deny_domains.clone()),
            deny_extensions: filters.deny_extensions.clone(),
            danger_substrings: filters.danger_substrings.clone(),
            exclude_substrings: filters.exclude_substrings.clone(),
        })
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    pub fn start_host(&self) -> &str {
        &self.start_host
    }

    /// Extracts every crawlable URL referenced by a document
    ///
    /// Runs all extraction layers, resolves each candidate against `base` and
    /// returns unique URLs in first-seen order. Candidates that fail to
    /// resolve are dropped.
    pub fn extract(&self, content: &str, base: &Url) -> Vec<Url> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        let candidates = extract_candidates(content)
            .into_iter()
            .chain(chunk_candidates(content, base));

        for candidate in candidates {
            match resolve_candidate(&candidate, base) {
                Ok(url) => {
                    if seen.insert(url.as_str().to_string()) {
                        urls.push(url);
                    }
                }
                Err(e) => {
                    tracing::debug!("Dropped candidate '{}' from {}: {}", candidate, base, e);
                }
            }
        }

        urls
    }

    /// Runs a URL through the admission gate
    ///
    /// # Gate Order
    ///
    /// 1. Scheme and host
    /// 2. Whitelist scope
    /// 3. Domain deny list (allow list overrides)
    /// 4. Extension deny list (path only)
    /// 5. Exclude substrings
    /// 6. Danger substrings (`.js` paths are exempt)
    /// 7. Internal or external according to the scope mode
    pub fn classify(&self, url: &Url) -> UrlClass {
        let host = match (url.scheme(), extract_domain(url)) {
            ("http" | "https", Some(host)) if !host.is_empty() => host,
            _ => return UrlClass::Excluded(ExclusionReason::Scheme),
        };

        let same_site = registrable_domain(&host) == self.start_domain;

        if self.scope == ScopeMode::WhitelistOnly && !same_site && !self.policy.is_allowed(&host) {
            return UrlClass::OutOfScope;
        }

        if !self.policy.permits(&host) {
            return UrlClass::Excluded(ExclusionReason::DeniedDomain);
        }

        if self.has_denied_extension(url) {
            return UrlClass::Excluded(ExclusionReason::Extension);
        }

        if self.matches_exclude(url) {
            return UrlClass::Excluded(ExclusionReason::Pattern);
        }

        if self.is_dangerous(url) {
            return UrlClass::Dangerous;
        }

        match self.scope {
            ScopeMode::MainDomainOnly if same_site => UrlClass::Internal,
            ScopeMode::MainDomainOnly => UrlClass::External,
            ScopeMode::ExternalOnce if host == self.start_host => UrlClass::Internal,
            ScopeMode::ExternalOnce => UrlClass::External,
            ScopeMode::Unrestricted | ScopeMode::WhitelistOnly => UrlClass::Internal,
        }
    }

    /// Returns true if the URL path ends with a denied extension
    ///
    /// The query string is ignored, so `/image.png?v=1` matches `.png`.
    pub fn has_denied_extension(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        self.deny_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    /// Returns true if the URL contains an exclude substring
    pub fn matches_exclude(&self, url: &Url) -> bool {
        let lower = url.as_str().to_lowercase();
        self.exclude_substrings.iter().any(|s| lower.contains(s.as_str()))
    }

    /// Returns true if the URL's path or query contains a danger keyword
    ///
    /// Scripts are exempt: their names routinely contain words like
    /// `delete` without triggering anything when fetched.
    pub fn is_dangerous(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        if path.ends_with(".js") {
            return false;
        }

        let target = match url.query() {
            Some(query) => format!("{}?{}", path, query.to_lowercase()),
            None => path,
        };
        self.danger_substrings.iter().any(|s| target.contains(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher_with(scope: ScopeMode, build: impl FnOnce(&mut ScanConfig)) -> UrlMatcher {
        let mut config = ScanConfig::builder("https://www.example.com/app/index.html")
            .scope(scope)
            .build()
            .unwrap();
        build(&mut config);
        config.normalize();
        UrlMatcher::new(&config).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify_main_domain_only() {
        let matcher = matcher_with(ScopeMode::MainDomainOnly, |_| {});
        assert_eq!(matcher.classify(&url("https://www.example.com/a")), UrlClass::Internal);
        assert_eq!(matcher.classify(&url("https://cdn.example.com/b.js")), UrlClass::Internal);
        assert_eq!(matcher.classify(&url("http://other.com/c")), UrlClass::External);
    }

    #[test]
    fn test_classify_external_once() {
        let matcher = matcher_with(ScopeMode::ExternalOnce, |_| {});
        assert_eq!(matcher.classify(&url("https://www.example.com/a")), UrlClass::Internal);
        assert_eq!(matcher.classify(&url("https://cdn.example.com/b")), UrlClass::External);
        assert_eq!(matcher.classify(&url("https://other.com/")), UrlClass::External);
    }

    #[test]
    fn test_classify_unrestricted() {
        let matcher = matcher_with(ScopeMode::Unrestricted, |_| {});
        assert_eq!(matcher.classify(&url("https://other.com/")), UrlClass::Internal);
    }

    #[test]
    fn test_classify_whitelist() {
        let matcher = matcher_with(ScopeMode::WhitelistOnly, |c| {
            c.filters.allow_domains.push("partner.io".to_string());
        });
        assert_eq!(matcher.classify(&url("https://api.partner.io/x")), UrlClass::Internal);
        assert_eq!(matcher.classify(&url("https://example.com/x")), UrlClass::Internal);
        assert_eq!(matcher.classify(&url("https://other.com/x")), UrlClass::OutOfScope);
    }

    #[test]
    fn test_extension_is_path_only() {
        let matcher = matcher_with(ScopeMode::MainDomainOnly, |_| {});
        assert_eq!(
            matcher.classify(&url("https://example.com/image.png?v=1")),
            UrlClass::Excluded(ExclusionReason::Extension)
        );
        assert_eq!(
            matcher.classify(&url("https://example.com/view?file=a.png")),
            UrlClass::Internal
        );
    }

    #[test]
    fn test_deny_domain_with_allow_override() {
        let matcher = matcher_with(ScopeMode::MainDomainOnly, |c| {
            c.filters.deny_domains.push("example.com".to_string());
            c.filters.allow_domains.push("api.example.com".to_string());
        });
        assert_eq!(
            matcher.classify(&url("https://www.example.com/")),
            UrlClass::Excluded(ExclusionReason::DeniedDomain)
        );
        assert_eq!(matcher.classify(&url("https://api.example.com/")), UrlClass::Internal);
    }

    #[test]
    fn test_dangerous_urls() {
        let matcher = matcher_with(ScopeMode::MainDomainOnly, |_| {});
        assert_eq!(
            matcher.classify(&url("https://example.com/user/delete?id=1")),
            UrlClass::Dangerous
        );
        assert_eq!(
            matcher.classify(&url("https://example.com/account?action=logout")),
            UrlClass::Dangerous
        );
        assert_eq!(
            matcher.classify(&url("https://example.com/static/delete-button.js")),
            UrlClass::Internal
        );
    }

    #[test]
    fn test_danger_keyword_in_host_is_ignored() {
        let matcher = matcher_with(ScopeMode::Unrestricted, |_| {});
        assert_eq!(matcher.classify(&url("https://dropbox.com/home")), UrlClass::Internal);
    }

    #[test]
    fn test_exclude_runs_before_danger() {
        let matcher = matcher_with(ScopeMode::MainDomainOnly, |c| {
            c.filters.exclude_substrings.push("/admin/".to_string());
        });
        assert_eq!(
            matcher.classify(&url("https://example.com/admin/delete")),
            UrlClass::Excluded(ExclusionReason::Pattern)
        );
    }

    #[test]
    fn test_non_http_excluded() {
        let matcher = matcher_with(ScopeMode::MainDomainOnly, |_| {});
        assert_eq!(
            matcher.classify(&url("ftp://example.com/file")),
            UrlClass::Excluded(ExclusionReason::Scheme)
        );
    }

    #[test]
    fn test_extract_resolves_and_deduplicates() {
        let matcher = matcher_with(ScopeMode::MainDomainOnly, |_| {});
        let base = url("http://example.com/");
        let html = r#"
            <a href="/a">A</a>
            <a href="//cdn.example.com/b.js">B</a>
            <a href="http://other.com/c">C</a>
            <a href="/a">A again</a>
            <a href="javascript:void(0)">noop</a>
        "#;

        let found: Vec<String> = matcher
            .extract(html, &base)
            .into_iter()
            .map(|u| u.to_string())
            .collect();

        assert!(found.contains(&"http://example.com/a".to_string()));
        assert!(found.contains(&"http://cdn.example.com/b.js".to_string()));
        assert!(found.contains(&"http://other.com/c".to_string()));
        assert_eq!(found.iter().filter(|u| u.ends_with("/a")).count(), 1);
        assert!(!found.iter().any(|u| u.contains("javascript")));
    }

    #[test]
    fn test_domain_policy() {
        let policy = DomainPolicy::new(
            vec!["good.bad.com".to_string()],
            vec!["bad.com".to_string()],
        );
        assert!(!policy.permits("bad.com"));
        assert!(!policy.permits("www.bad.com"));
        assert!(policy.permits("good.bad.com"));
        assert!(policy.permits("other.com"));
    }
}
