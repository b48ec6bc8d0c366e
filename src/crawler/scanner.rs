//! Scan orchestration
//!
//! The scanner owns the run lifecycle:
//!
//! ```text
//! Idle -> Seeding -> Draining -> Stopping -> Cleanup -> Done
//! ```
//!
//! Main workers crawl recursively from the start URL. One external worker
//! visits out-of-scope URLs exactly once without following their links.

use super::fetcher::{FetchOutcome, HttpFetcher};
use super::queue::{WorkItem, WorkQueue};
use super::result::{build_result, PageResult};
use crate::config::{validate, ScanConfig};
use crate::output::{print_statistics, OutputHandler, ScanStatistics};
use crate::sensitive::SensitiveDetector;
use crate::state::{
    DangerousUrlRegistry, ExternalLedger, MembershipFilter, RequestBudget,
};
use crate::url::{UrlClass, UrlMatcher};
use crate::ScanError;
use chrono::Utc;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How long a worker waits on an empty queue before re-checking for stop
const POP_WAIT: Duration = Duration::from_millis(250);

/// Lifecycle state of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    Idle,
    Seeding,
    Draining,
    Stopping,
    Cleanup,
    Done,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::Draining => "draining",
            Self::Stopping => "stopping",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything a scan produced
#[derive(Debug)]
pub struct ScanReport {
    /// Emitted results, in emission order
    pub results: Vec<PageResult>,
    /// URLs skipped by the danger keyword guard, in discovery order
    pub dangerous_urls: Vec<String>,
    /// External URLs discovered but never fetched
    pub unvisited_external: Vec<String>,
    pub statistics: ScanStatistics,
}

/// Shared state handed to every worker
///
/// Each member guards itself; there is no lock around the context as a whole.
#[derive(Debug)]
pub struct ScanContext {
    pub config: Arc<ScanConfig>,
    pub matcher: UrlMatcher,
    pub fetcher: HttpFetcher,
    pub detector: SensitiveDetector,
    pub output: OutputHandler,
    pub seen: MembershipFilter,
    pub dangerous: DangerousUrlRegistry,
    pub externals: ExternalLedger,
    pub budget: Arc<RequestBudget>,
    pub main_queue: WorkQueue,
    pub external_queue: WorkQueue,
    running: AtomicBool,
}

impl ScanContext {
    /// Builds all shared state for a scan
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, HTTP client construction, or when the
    /// CSV report cannot be created.
    pub fn new(mut config: ScanConfig) -> Result<Self, ScanError> {
        // Fields may have been edited after `build`
        config.normalize();
        validate(&config)?;

        let config = Arc::new(config);
        let matcher = UrlMatcher::new(&config)?;
        let budget = Arc::new(RequestBudget::new(config.scan.max_requests));
        let fetcher = HttpFetcher::new(
            Arc::clone(&config),
            matcher.policy().clone(),
            Arc::clone(&budget),
        )?;
        let seen = MembershipFilter::new(
            config.dedup.expected_urls,
            config.dedup.false_positive_rate,
        )?;
        let output = OutputHandler::new(&config, matcher.clone())?;

        Ok(Self {
            detector: SensitiveDetector::new(&config.sensitive),
            matcher,
            fetcher,
            output,
            seen,
            dangerous: DangerousUrlRegistry::new(),
            externals: ExternalLedger::new(),
            budget,
            main_queue: WorkQueue::new(),
            external_queue: WorkQueue::new(),
            running: AtomicBool::new(false),
            config,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Routes a discovered URL found on a page at `depth`
    ///
    /// | Class | Action |
    /// |-------|--------|
    /// | Internal | Main queue at `depth + 1`, unless past `max_depth` |
    /// | External | External queue, visited once |
    /// | Dangerous | Recorded, never fetched |
    /// | OutOfScope | Recorded as an unvisited external URL |
    /// | Excluded | Dropped |
    ///
    /// Queue admission goes through the membership filter, so every URL is
    /// enqueued at most once per run.
    pub fn route(&self, url: Url, depth: u32) {
        match self.matcher.classify(&url) {
            UrlClass::Internal => {
                let next = depth + 1;
                if next > self.config.scan.max_depth || !self.is_running() {
                    return;
                }
                if self.seen.insert(url.as_str()) {
                    tracing::trace!("Queued {} at depth {}", url, next);
                    self.main_queue.push(WorkItem::new(url, next));
                }
            }
            UrlClass::External => {
                if !self.is_running() {
                    return;
                }
                if self.seen.insert(url.as_str()) {
                    self.externals.record_discovered(url.as_str());
                    self.external_queue.push(WorkItem::new(url, depth + 1));
                }
            }
            UrlClass::Dangerous => {
                self.dangerous.record(url.as_str());
            }
            UrlClass::OutOfScope => {
                self.externals.record_discovered(url.as_str());
            }
            UrlClass::Excluded(reason) => {
                tracing::trace!("Excluded {} ({:?})", url, reason);
            }
        }
    }
}

/// Runs a scan from the configured start URL
pub struct Scanner {
    ctx: Arc<ScanContext>,
    state: RwLock<ScanState>,
    stop: CancellationToken,
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("state", &self.state())
            .field("start_url", &self.ctx.config.scan.start_url)
            .finish()
    }
}

impl Scanner {
    /// Creates a scanner in the `Idle` state
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        Ok(Self {
            ctx: Arc::new(ScanContext::new(config)?),
            state: RwLock::new(ScanState::Idle),
            stop: CancellationToken::new(),
        })
    }

    /// Token that stops the scan when cancelled
    ///
    /// Workers observe it at every queue pop, delay and fetch.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn state(&self) -> ScanState {
        *self.state.read()
    }

    pub fn context(&self) -> &Arc<ScanContext> {
        &self.ctx
    }

    fn set_state(&self, state: ScanState) {
        tracing::debug!("Scanner state: {}", state);
        *self.state.write() = state;
    }

    /// Runs the scan to completion
    ///
    /// Resolves once the main queue is drained or the stop handle fires,
    /// after both worker pools are shut down and the transport is closed.
    pub async fn run(&self) -> Result<ScanReport, ScanError> {
        let started_at = Utc::now();
        let started = Instant::now();
        let ctx = &self.ctx;

        // Seeding
        self.set_state(ScanState::Seeding);
        let start = Url::parse(&ctx.config.scan.start_url)?;
        ctx.running.store(true, Ordering::SeqCst);
        ctx.seen.insert(start.as_str());
        ctx.main_queue.push(WorkItem::new(start.clone(), 0));
        tracing::info!(
            "Scanning {} (scope: {}, workers: {}, max depth: {})",
            start,
            ctx.config.scan.scope,
            ctx.config.scan.workers,
            ctx.config.scan.max_depth
        );

        // Draining
        self.set_state(ScanState::Draining);
        let main_stop = self.stop.child_token();
        let external_stop = self.stop.child_token();

        let workers: Vec<JoinHandle<()>> = (0..ctx.config.scan.workers)
            .map(|id| {
                tokio::spawn(main_worker(id, Arc::clone(ctx), main_stop.clone()))
            })
            .collect();
        let external = tokio::spawn(external_worker(Arc::clone(ctx), external_stop.clone()));

        tokio::select! {
            _ = ctx.main_queue.join() => tracing::info!("Main queue drained"),
            _ = self.stop.cancelled() => tracing::info!("Stop requested"),
        }

        // Stopping
        self.set_state(ScanState::Stopping);
        ctx.running.store(false, Ordering::SeqCst);
        main_stop.cancel();

        // Cleanup
        self.set_state(ScanState::Cleanup);
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::warn!("Worker task failed: {}", e);
            }
        }

        let join_timeout = ctx.config.external_join_timeout();
        if self.stop.is_cancelled() {
            tracing::debug!("Skipping external queue drain after stop");
        } else if tokio::time::timeout(join_timeout, ctx.external_queue.join())
            .await
            .is_err()
        {
            tracing::warn!(
                "External queue not drained after {:?}; {} URLs left",
                join_timeout,
                ctx.external_queue.pending()
            );
        }
        external_stop.cancel();
        if let Err(e) = external.await {
            tracing::warn!("External worker task failed: {}", e);
        }
        ctx.fetcher.close();

        // Done
        let dangerous_urls = ctx.dangerous.snapshot();
        let unvisited_external = ctx.externals.unvisited();
        ctx.output.finalize(&dangerous_urls, &unvisited_external);

        let counts = ctx.output.counts();
        let statistics = ScanStatistics {
            started_at: Some(started_at),
            duration: started.elapsed(),
            requests_issued: ctx.fetcher.requests_issued(),
            results_emitted: counts.emitted,
            duplicates: counts.duplicates,
            filtered: counts.filtered,
            results_by_status: counts.by_status,
            pages_with_findings: counts.with_findings,
            dangerous_urls: dangerous_urls.len(),
            external_discovered: ctx.externals.discovered_count(),
            external_unvisited: unvisited_external.len(),
        };
        print_statistics(&statistics);
        if let Some(path) = ctx.output.csv_path() {
            tracing::info!("CSV report written to {}", path.display());
        }

        self.set_state(ScanState::Done);

        Ok(ScanReport {
            results: ctx.output.take_results(),
            dangerous_urls,
            unvisited_external,
            statistics,
        })
    }
}

/// Waits for the configured per-request delay; false if stopped meanwhile
async fn wait_delay(ctx: &ScanContext, stop: &CancellationToken) -> bool {
    let delay = ctx.config.delay();
    if delay.is_zero() {
        return !stop.is_cancelled();
    }
    tokio::select! {
        _ = stop.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Pops main-queue items until stopped
async fn main_worker(id: usize, ctx: Arc<ScanContext>, stop: CancellationToken) {
    tracing::trace!("Worker {} started", id);

    while !stop.is_cancelled() {
        let item = tokio::select! {
            _ = stop.cancelled() => break,
            item = ctx.main_queue.pop(POP_WAIT) => item,
        };

        if let Some(item) = item {
            let _done = ctx.main_queue.done_guard();
            process_main_item(&ctx, item, &stop).await;
        }
    }

    tracing::trace!("Worker {} stopped", id);
}

async fn process_main_item(ctx: &ScanContext, item: WorkItem, stop: &CancellationToken) {
    // Re-apply the admission gate; the start URL and anything queued
    // earlier still has to pass it
    match ctx.matcher.classify(&item.url) {
        UrlClass::Internal | UrlClass::External => {}
        UrlClass::Dangerous => {
            ctx.dangerous.record(item.url.as_str());
            return;
        }
        UrlClass::OutOfScope => {
            ctx.externals.record_discovered(item.url.as_str());
            return;
        }
        UrlClass::Excluded(reason) => {
            tracing::debug!("Skipping {} ({:?})", item.url, reason);
            return;
        }
    }

    if ctx.output.is_exhausted() || !wait_delay(ctx, stop).await {
        return;
    }

    let response = match ctx.fetcher.fetch(&item.url, stop).await {
        FetchOutcome::Completed(response) => Ok(response),
        FetchOutcome::Failed(error) => Err(error),
        FetchOutcome::Refused(reason) => {
            tracing::trace!("Fetch of {} refused ({:?})", item.url, reason);
            return;
        }
    };
    if ctx.fetcher.reset_due() {
        ctx.fetcher.reset_pool();
    }

    let built = build_result(&item.url, response, item.depth, &ctx.detector);
    let base = built.result.url.clone();
    ctx.output.handle(built.result);

    // A redirect may have left the scope; such pages are visited, not followed
    if base != item.url && !matches!(ctx.matcher.classify(&base), UrlClass::Internal) {
        tracing::debug!("Not following links of {} (redirected out of scope)", base);
        return;
    }

    if let Some(text) = built.text {
        for url in ctx.matcher.extract(&text, &base) {
            ctx.route(url, item.depth);
        }
    }
}

/// Visits each external URL once; never extracts links
async fn external_worker(ctx: Arc<ScanContext>, stop: CancellationToken) {
    while !stop.is_cancelled() {
        let item = tokio::select! {
            _ = stop.cancelled() => break,
            item = ctx.external_queue.pop(POP_WAIT) => item,
        };

        if let Some(item) = item {
            let _done = ctx.external_queue.done_guard();
            process_external_item(&ctx, item, &stop).await;
        }
    }
}

async fn process_external_item(ctx: &ScanContext, item: WorkItem, stop: &CancellationToken) {
    if ctx.output.is_exhausted() || !wait_delay(ctx, stop).await {
        return;
    }

    let response = match ctx.fetcher.fetch(&item.url, stop).await {
        FetchOutcome::Completed(response) => Ok(response),
        FetchOutcome::Failed(error) => Err(error),
        FetchOutcome::Refused(reason) => {
            tracing::trace!("External fetch of {} refused ({:?})", item.url, reason);
            return;
        }
    };
    ctx.externals.mark_visited(item.url.as_str());

    let built = build_result(&item.url, response, item.depth, &ctx.detector);
    ctx.output.handle(built.result);
}
