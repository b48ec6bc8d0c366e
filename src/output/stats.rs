//! Scan statistics
//!
//! This module aggregates the counters kept during a run into a summary
//! and prints it at the end of the scan.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Scan statistics summary
#[derive(Debug, Clone, Default)]
pub struct ScanStatistics {
    /// When the scan started
    pub started_at: Option<DateTime<Utc>>,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Requests sent (one per logical fetch)
    pub requests_issued: usize,

    /// Results printed and recorded
    pub results_emitted: usize,

    /// Repeated sightings of an already reported URL
    pub duplicates: usize,

    /// Results dropped by the filter chain
    pub filtered: usize,

    /// Emitted results by status (`200`, `404`, `Timeout`, ...)
    pub results_by_status: BTreeMap<String, usize>,

    /// Emitted results that carried sensitive findings
    pub pages_with_findings: usize,

    /// URLs skipped by the danger keyword guard
    pub dangerous_urls: usize,

    /// External URLs discovered
    pub external_discovered: usize,

    /// External URLs never fetched
    pub external_unvisited: usize,
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ScanStatistics) {
    println!("\n=== Scan Statistics ===\n");

    println!("Overview:");
    if let Some(started) = stats.started_at {
        println!("  Started: {}", started.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Duration: {:.1}s", stats.duration.as_secs_f64());
    println!("  Requests issued: {}", stats.requests_issued);
    println!("  Results emitted: {}", stats.results_emitted);
    println!("  Duplicates: {}", stats.duplicates);
    println!("  Filtered: {}", stats.filtered);
    println!();

    if !stats.results_by_status.is_empty() {
        println!("Results by Status:");
        // Sort statuses by count (descending)
        let mut status_counts: Vec<_> = stats.results_by_status.iter().collect();
        status_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (status, count) in status_counts {
            let percentage = if stats.results_emitted > 0 {
                (*count as f64 / stats.results_emitted as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", status, count, percentage);
        }
        println!();
    }

    println!("Findings:");
    println!("  Pages with sensitive content: {}", stats.pages_with_findings);
    println!("  Dangerous URLs skipped: {}", stats.dangerous_urls);
    println!(
        "  External URLs: {} discovered, {} unvisited",
        stats.external_discovered, stats.external_unvisited
    );
}
