//! Sensitive content detection
//!
//! Scans decoded page bodies for credentials, personal data and other
//! material that should not be publicly reachable.

mod patterns;

use crate::config::PatternEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

/// Maximum number of sample values kept per finding
const MAX_SAMPLES: usize = 3;

/// Sample values longer than this are truncated
const MAX_SAMPLE_CHARS: usize = 80;

/// One pattern that matched at least once in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensitiveFinding {
    pub pattern_name: String,
    /// Number of distinct matched values
    pub unique_match_count: usize,
    pub sample_values: Vec<String>,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    name: String,
    regex: Regex,
}

static BUILTIN: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    patterns::BUILTIN_PATTERNS
        .iter()
        .filter_map(|(name, source)| compile(name, source))
        .collect()
});

fn compile(name: &str, source: &str) -> Option<CompiledPattern> {
    match Regex::new(source) {
        Ok(regex) => Some(CompiledPattern {
            name: name.to_string(),
            regex,
        }),
        Err(e) => {
            tracing::debug!("Skipping sensitive pattern '{}': {}", name, e);
            None
        }
    }
}

/// Named-regex scanner shared by all workers
#[derive(Debug, Clone)]
pub struct SensitiveDetector {
    extra: Vec<CompiledPattern>,
}

impl Default for SensitiveDetector {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl SensitiveDetector {
    /// Creates a detector with the built-in patterns plus `extra`
    ///
    /// Extra patterns that fail to compile are logged and skipped.
    pub fn new(extra: &[PatternEntry]) -> Self {
        let extra = extra
            .iter()
            .filter_map(|entry| compile(&entry.name, &entry.regex))
            .collect();
        Self { extra }
    }

    /// Number of usable patterns
    pub fn pattern_count(&self) -> usize {
        BUILTIN.len() + self.extra.len()
    }

    /// Scans text and returns one finding per pattern that matched
    pub fn scan(&self, text: &str) -> Vec<SensitiveFinding> {
        if text.is_empty() {
            return Vec::new();
        }

        BUILTIN
            .iter()
            .chain(self.extra.iter())
            .filter_map(|pattern| scan_pattern(pattern, text))
            .collect()
    }
}

fn scan_pattern(pattern: &CompiledPattern, text: &str) -> Option<SensitiveFinding> {
    let mut seen = HashSet::new();
    let mut samples = Vec::new();

    for captures in pattern.regex.captures_iter(text) {
        let value = match captures.get(1).or_else(|| captures.get(0)) {
            Some(m) => m.as_str(),
            None => continue,
        };
        if value.is_empty() || !seen.insert(value.to_string()) {
            continue;
        }
        if samples.len() < MAX_SAMPLES {
            samples.push(truncate(value));
        }
    }

    if seen.is_empty() {
        return None;
    }

    Some(SensitiveFinding {
        pattern_name: pattern.name.clone(),
        unique_match_count: seen.len(),
        sample_values: samples,
    })
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_SAMPLE_CHARS {
        value.to_string()
    } else {
        let cut: String = value.chars().take(MAX_SAMPLE_CHARS).collect();
        format!("{}...", cut)
    }
}
