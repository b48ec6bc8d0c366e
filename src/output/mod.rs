//! Output module for scan results
//!
//! This module handles:
//! - Filtering page results through the fixed filter chain
//! - Per-URL duplicate tracking
//! - Console and CSV emission under a single output lock
//! - Final appendices and scan statistics

pub mod console;
pub mod csv;
mod filters;
pub mod stats;

pub use csv::{CsvReport, CSV_HEADER, DANGEROUS_STATUS, UNVISITED_EXTERNAL_STATUS};
pub use filters::{FilterReason, ResultFilters};
pub use stats::{print_statistics, ScanStatistics};

use crate::config::ScanConfig;
use crate::crawler::PageResult;
use crate::state::DuplicateVisitCounter;
use crate::url::UrlMatcher;
use crate::ConfigError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Output-specific errors
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid output filter: {0}")]
    Filter(#[from] ConfigError),
}

/// What happened to a result handed to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Printed and recorded; `persisted` tells whether a CSV row was written
    Emitted { persisted: bool },
    /// Repeated sighting of an already emitted URL
    Duplicate,
    /// Dropped by the filter chain
    Filtered(FilterReason),
    /// `max_urls` already reached
    LimitReached,
}

#[derive(Debug, Default)]
struct OutputState {
    results: Vec<PageResult>,
    duplicates: usize,
    filtered: usize,
    by_status: BTreeMap<String, usize>,
    with_findings: usize,
}

/// Counters snapshot used for the final statistics
#[derive(Debug, Clone, Default)]
pub struct OutputCounts {
    pub emitted: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub by_status: BTreeMap<String, usize>,
    pub with_findings: usize,
}

/// Decides which results are shown and persisted
///
/// Shared by all workers. The filter chain runs outside the lock; console
/// output, CSV rows and the result list are updated under one lock so lines
/// never interleave.
#[derive(Debug)]
pub struct OutputHandler {
    filters: ResultFilters,
    duplicates: DuplicateVisitCounter,
    csv: Option<CsvReport>,
    show_duplicates: bool,
    max_urls: Option<usize>,
    emitted: AtomicUsize,
    state: Mutex<OutputState>,
}

impl OutputHandler {
    /// Creates the handler, writing the CSV header if a report path is set
    pub fn new(config: &ScanConfig, matcher: UrlMatcher) -> Result<Self, OutputError> {
        let csv = match &config.output.csv_path {
            Some(path) => {
                let report = CsvReport::create(path)?;
                tracing::info!("Writing CSV report to {}", path);
                Some(report)
            }
            None => None,
        };

        Ok(Self {
            filters: ResultFilters::new(config, matcher)?,
            duplicates: DuplicateVisitCounter::new(),
            csv,
            show_duplicates: config.output.show_duplicates,
            max_urls: config.scan.max_urls,
            emitted: AtomicUsize::new(0),
            state: Mutex::new(OutputState::default()),
        })
    }

    /// Runs a result through the filter chain and emits it
    ///
    /// # Processing Steps
    ///
    /// 1. Filters 1 to 6 (status, domain, extension, danger, exclude, title)
    /// 2. Allow substrings decide whether a CSV row is written
    /// 3. Exact-URL duplicate check: repeats are tagged, shown only when
    ///    `show_duplicates` is set, and never written to the CSV
    /// 4. `max_urls` budget
    pub fn handle(&self, result: PageResult) -> Disposition {
        if let Err(reason) = self.filters.check(&result) {
            tracing::trace!("Filtered {} ({:?})", result.url, reason);
            self.state.lock().filtered += 1;
            return Disposition::Filtered(reason);
        }

        let persist = self.filters.persist_allowed(&result);

        let mut state = self.state.lock();

        if self.duplicates.count(result.url.as_str()) > 0 {
            self.duplicates.record(result.url.as_str());
            state.duplicates += 1;
            if self.show_duplicates {
                console::print_result(&result.with_duplicate(true));
            }
            return Disposition::Duplicate;
        }

        // Only emitted results count as first sightings
        if !self.reserve_slot() {
            return Disposition::LimitReached;
        }
        self.duplicates.record(result.url.as_str());

        console::print_result(&result);

        let mut persisted = false;
        if persist {
            if let Some(csv) = &self.csv {
                match csv.append(&result) {
                    Ok(()) => persisted = true,
                    Err(e) => tracing::warn!("CSV write failed for {}: {}", result.url, e),
                }
            }
        }

        *state.by_status.entry(result.status.to_string()).or_insert(0) += 1;
        if result.has_findings() {
            state.with_findings += 1;
        }
        state.results.push(result);

        Disposition::Emitted { persisted }
    }

    fn reserve_slot(&self) -> bool {
        match self.max_urls {
            None => {
                self.emitted.fetch_add(1, Ordering::SeqCst);
                true
            }
            Some(limit) => self
                .emitted
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < limit).then_some(n + 1)
                })
                .is_ok(),
        }
    }

    /// Returns true once `max_urls` results have been emitted
    pub fn is_exhausted(&self) -> bool {
        self.max_urls
            .is_some_and(|limit| self.emitted.load(Ordering::SeqCst) >= limit)
    }

    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Appends the dangerous and unvisited-external appendices
    pub fn finalize(&self, dangerous: &[String], unvisited: &[String]) {
        let _state = self.state.lock();

        let sections = [
            ("Dangerous endpoints (not visited)", DANGEROUS_STATUS, dangerous),
            ("Unvisited external URLs", UNVISITED_EXTERNAL_STATUS, unvisited),
        ];

        for (heading, status, urls) in sections {
            if urls.is_empty() {
                continue;
            }
            println!("\n{} ({}):", heading, urls.len());
            for url in urls {
                console::print_marker(url, status);
                if let Some(csv) = &self.csv {
                    if let Err(e) = csv.append_marker(url, status) {
                        tracing::warn!("CSV write failed for {}: {}", url, e);
                    }
                }
            }
        }
    }

    /// Moves the emitted results out of the handler
    pub fn take_results(&self) -> Vec<PageResult> {
        std::mem::take(&mut self.state.lock().results)
    }

    pub fn counts(&self) -> OutputCounts {
        let state = self.state.lock();
        OutputCounts {
            emitted: self.emitted(),
            duplicates: state.duplicates,
            filtered: state.filtered,
            by_status: state.by_status.clone(),
            with_findings: state.with_findings,
        }
    }

    pub fn csv_path(&self) -> Option<&std::path::Path> {
        self.csv.as_ref().map(CsvReport::path)
    }
}
