//! Result filter chain
//!
//! Applied to every page result before it reaches the console or the CSV.
//! The order is fixed; the first failing filter decides the reason.

use crate::config::ScanConfig;
use crate::crawler::PageResult;
use crate::url::{extract_domain, UrlMatcher};
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;

/// Why a result was kept off the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterReason {
    Status,
    Domain,
    Extension,
    Dangerous,
    Pattern,
    Title,
}

/// Compiled filter chain for one scan
#[derive(Debug)]
pub struct ResultFilters {
    statuses: HashSet<u16>,
    matcher: UrlMatcher,
    titles: Vec<Regex>,
    allow_substrings: Vec<String>,
}

impl ResultFilters {
    /// Compiles the configured filters
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if a title filter is not a valid regex.
    pub fn new(config: &ScanConfig, matcher: UrlMatcher) -> Result<Self, ConfigError> {
        let titles = config
            .filters
            .title_filters
            .iter()
            .map(|source| {
                Regex::new(source)
                    .map_err(|e| ConfigError::InvalidPattern(format!("title filter '{}': {}", source, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            statuses: config.filters.status_filters.iter().copied().collect(),
            matcher,
            titles,
            allow_substrings: config.filters.allow_substrings.clone(),
        })
    }

    /// Runs filters 1 to 6 of the chain
    ///
    /// # Filter Order
    ///
    /// 1. Status deny list
    /// 2. Domain allow/deny (allow overrides deny)
    /// 3. Extension deny list, path only
    /// 4. Danger substrings (`.js` exempt)
    /// 5. Exclude substrings
    /// 6. Title deny regexes
    pub fn check(&self, result: &PageResult) -> Result<(), FilterReason> {
        if result
            .status
            .code()
            .is_some_and(|code| self.statuses.contains(&code))
        {
            return Err(FilterReason::Status);
        }

        let host = extract_domain(&result.url).unwrap_or_default();
        if !self.matcher.policy().permits(&host) {
            return Err(FilterReason::Domain);
        }

        if self.matcher.has_denied_extension(&result.url) {
            return Err(FilterReason::Extension);
        }

        if self.matcher.is_dangerous(&result.url) {
            return Err(FilterReason::Dangerous);
        }

        if self.matcher.matches_exclude(&result.url) {
            return Err(FilterReason::Pattern);
        }

        if !result.title.is_empty() && self.titles.iter().any(|re| re.is_match(&result.title)) {
            return Err(FilterReason::Title);
        }

        Ok(())
    }

    /// Filter 7: with a non-empty allow list, only matching URLs go to the CSV
    pub fn persist_allowed(&self, result: &PageResult) -> bool {
        if self.allow_substrings.is_empty() {
            return true;
        }
        let url = result.url.as_str().to_lowercase();
        self.allow_substrings.iter().any(|s| url.contains(s.as_str()))
    }
}
