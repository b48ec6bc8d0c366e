//! Crawler module for fetching and processing pages
//!
//! This module contains the core scanning logic, including:
//! - HTTP fetching with retry logic and manual redirects
//! - Page result construction and charset handling
//! - Work queues with join semantics
//! - Overall scan orchestration

mod fetcher;
mod queue;
mod result;
mod scanner;

pub use fetcher::{
    build_http_client, ErrorKind, FetchError, FetchOutcome, FetchResponse, HttpFetcher, Refusal,
};
pub use queue::{TaskGuard, WorkItem, WorkQueue};
pub use result::{build_result, BuiltPage, FetchStatus, PageResult};
pub use scanner::{ScanContext, ScanReport, ScanState, Scanner};

use crate::config::ScanConfig;
use crate::ScanError;

/// Runs a complete scan
///
/// This is the main entry point for starting a scan. It will:
/// 1. Build the shared scan context (client, filters, CSV report)
/// 2. Seed the main queue with the start URL
/// 3. Drain the main and external queues with worker tasks
/// 4. Append the dangerous and unvisited-external appendices
///
/// # Arguments
///
/// * `config` - The validated scan configuration
///
/// # Returns
///
/// * `Ok(ScanReport)` - Scan completed
/// * `Err(ScanError)` - The scan could not be set up
pub async fn scan(config: ScanConfig) -> Result<ScanReport, ScanError> {
    Scanner::new(config)?.run().await
}
