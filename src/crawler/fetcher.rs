//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scanner, including:
//! - Building the pooled HTTP client from the scan configuration
//! - Domain and request-budget admission before any network traffic
//! - Retry logic for transient failures
//! - Manual redirect handling with chain recording
//! - Error classification

use crate::config::ScanConfig;
use crate::state::RequestBudget;
use crate::url::{extract_domain, DomainPolicy};
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Proxy};
use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Attempts per logical fetch
const MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Longest redirect chain followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Failure family of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Timeout,
    Tls,
    Redirect,
    Other,
}

impl ErrorKind {
    /// Tag shown in the status column in place of an HTTP code
    pub fn status_tag(&self) -> &'static str {
        match self {
            Self::Connection => "ConnectionError",
            Self::Timeout => "Timeout",
            Self::Tls => "SSLError",
            Self::Redirect => "RedirectError",
            Self::Other => "Error",
        }
    }

    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection | Self::Timeout | Self::Tls)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_tag())
    }
}

/// A fetch that failed after all retries
#[derive(Debug, Clone, Error)]
#[error("{kind} fetching {url}: {message}")]
pub struct FetchError {
    pub kind: ErrorKind,
    pub url: String,
    pub message: String,
}

impl FetchError {
    fn new(kind: ErrorKind, url: &Url, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.to_string(),
            message: message.into(),
        }
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        let kind = classify_error(&error);
        Self::new(kind, url, error.to_string())
    }
}

/// Maps a transport error onto an error family
///
/// TLS failures surface from reqwest as connect or generic errors, so the
/// source chain is searched for certificate and handshake wording.
fn classify_error(error: &reqwest::Error) -> ErrorKind {
    if error.is_timeout() {
        return ErrorKind::Timeout;
    }
    if error.is_redirect() {
        return ErrorKind::Redirect;
    }
    if mentions_tls(error) {
        return ErrorKind::Tls;
    }
    if error.is_connect() {
        return ErrorKind::Connection;
    }
    if error.is_request() || error.is_body() {
        // Resets mid-transfer and similar transport failures
        let mut source = error.source();
        while let Some(err) = source {
            if err.downcast_ref::<std::io::Error>().is_some() {
                return ErrorKind::Connection;
            }
            source = err.source();
        }
    }
    ErrorKind::Other
}

fn mentions_tls(error: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(err) = source {
        let text = err.to_string().to_lowercase();
        if ["certificate", "tls", "ssl", "handshake"]
            .iter()
            .any(|needle| text.contains(needle))
        {
            return true;
        }
        source = err.source();
    }
    false
}

/// Why a fetch was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Host is denied by the domain policy
    DeniedDomain,
    /// The request budget is spent
    BudgetExhausted,
    /// The transport has been closed
    Closed,
    /// The scan was stopped
    Cancelled,
}

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// URL the body was served from, after redirects
    pub final_url: Url,
    /// URLs visited before `final_url`, in order
    pub redirects: Vec<String>,
    pub body: Vec<u8>,
    pub elapsed: Duration,
}

impl FetchResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Result of one logical fetch
#[derive(Debug)]
pub enum FetchOutcome {
    Completed(FetchResponse),
    Failed(FetchError),
    Refused(Refusal),
}

/// Builds an HTTP client with the scan's transport settings
///
/// Redirects are disabled so the fetcher can record the chain itself. The
/// idle pool keeps two connections per host for every worker.
///
/// # Arguments
///
/// * `config` - The scan configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Invalid proxy or TLS backend failure
pub fn build_http_client(config: &ScanConfig) -> Result<Client, reqwest::Error> {
    let settings = &config.scan;

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );

    let mut builder = Client::builder()
        .user_agent(settings.user_agent.clone())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(config.timeout())
        .redirect(Policy::none())
        .pool_max_idle_per_host(settings.workers.saturating_mul(2).max(2))
        .pool_idle_timeout(Duration::from_secs(90))
        .danger_accept_invalid_certs(!settings.verify_tls)
        .gzip(true)
        .brotli(true);

    builder = match &settings.proxy {
        Some(proxy) => builder.proxy(Proxy::all(proxy.as_str())?),
        None => builder.no_proxy(),
    };

    builder.build()
}

/// Shared fetcher used by every worker
///
/// Wraps the pooled client behind a lock so the pool can be swapped out
/// while workers keep fetching with the client they already hold.
pub struct HttpFetcher {
    client: RwLock<Client>,
    config: Arc<ScanConfig>,
    policy: DomainPolicy,
    budget: Arc<RequestBudget>,
    closed: AtomicBool,
    budget_logged: AtomicBool,
    since_reset: AtomicUsize,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("issued", &self.budget.issued())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh connection pool
    pub fn new(
        config: Arc<ScanConfig>,
        policy: DomainPolicy,
        budget: Arc<RequestBudget>,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client: RwLock::new(client),
            config,
            policy,
            budget,
            closed: AtomicBool::new(false),
            budget_logged: AtomicBool::new(false),
            since_reset: AtomicUsize::new(0),
        })
    }

    /// Fetches a URL with admission checks, retries and manual redirects
    ///
    /// # Request Flow
    ///
    /// 1. Refuse if closed, the host is denied, or the budget is spent
    /// 2. Send GET, following redirects by hand (max 10 hops)
    ///    - A hop revisiting an earlier URL is a redirect loop
    ///    - A hop onto a denied domain ends the chain
    /// 3. Retry per the table below
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Connection error | Retry up to 3 attempts, 500ms apart |
    /// | Timeout | Retry up to 3 attempts, 500ms apart |
    /// | TLS/SSL error | Retry up to 3 attempts, 500ms apart |
    /// | Redirect loop or chain > 10 | Fail immediately |
    /// | Any HTTP status | Completed, no retry |
    ///
    /// One budget unit is spent per logical fetch, regardless of attempts
    /// and hops.
    pub async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> FetchOutcome {
        if self.closed.load(Ordering::SeqCst) {
            return FetchOutcome::Refused(Refusal::Closed);
        }

        let host = extract_domain(url).unwrap_or_default();
        if !self.policy.permits(&host) {
            tracing::debug!("Refusing {}: denied domain", url);
            return FetchOutcome::Refused(Refusal::DeniedDomain);
        }

        if !self.budget.try_acquire() {
            if !self.budget_logged.swap(true, Ordering::SeqCst) {
                tracing::info!(
                    "Request budget of {} exhausted; further fetches are skipped",
                    self.budget.limit().unwrap_or_default()
                );
            }
            return FetchOutcome::Refused(Refusal::BudgetExhausted);
        }
        self.since_reset.fetch_add(1, Ordering::SeqCst);

        let client = self.client.read().clone();
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => return FetchOutcome::Refused(Refusal::Cancelled),
                result = self.fetch_once(&client, url) => result,
            };

            match result {
                Ok(response) => return FetchOutcome::Completed(response),
                Err(error) if error.kind.is_retryable() && attempt < MAX_ATTEMPTS => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        MAX_ATTEMPTS,
                        url,
                        error
                    );
                    attempt += 1;
                    tokio::select! {
                        _ = cancel.cancelled() => return FetchOutcome::Refused(Refusal::Cancelled),
                        _ = tokio::time::sleep(RETRY_BACKOFF) => {}
                    }
                }
                Err(error) => {
                    tracing::debug!("Fetch failed: {}", error);
                    return FetchOutcome::Failed(error);
                }
            }
        }
    }

    async fn fetch_once(&self, client: &Client, url: &Url) -> Result<FetchResponse, FetchError> {
        let started = Instant::now();
        let mut current = url.clone();
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(current.to_string());

        loop {
            let response = client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            if let (true, Some(location)) = (status.is_redirection(), location) {
                if chain.len() >= MAX_REDIRECTS {
                    return Err(FetchError::new(
                        ErrorKind::Redirect,
                        url,
                        format!("more than {} redirects", MAX_REDIRECTS),
                    ));
                }

                let next = current.join(&location).map_err(|e| {
                    FetchError::new(
                        ErrorKind::Redirect,
                        url,
                        format!("invalid redirect target '{}': {}", location, e),
                    )
                })?;

                if !self.policy.permits(&extract_domain(&next).unwrap_or_default()) {
                    return Err(FetchError::new(
                        ErrorKind::Redirect,
                        url,
                        format!("redirect to denied domain: {}", next),
                    ));
                }

                if !visited.insert(next.to_string()) {
                    return Err(FetchError::new(
                        ErrorKind::Redirect,
                        url,
                        format!("redirect loop at {}", next),
                    ));
                }

                chain.push(current.to_string());
                current = next;
                continue;
            }

            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;

            return Ok(FetchResponse {
                status: status.as_u16(),
                headers,
                final_url: current,
                redirects: chain,
                body: body.to_vec(),
                elapsed: started.elapsed(),
            });
        }
    }

    /// Returns true once `pool_reset_interval` requests went through the current pool
    ///
    /// Claims the reset, so concurrent callers see true at most once per interval.
    pub fn reset_due(&self) -> bool {
        let interval = self.config.scan.pool_reset_interval;
        interval > 0
            && self
                .since_reset
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n >= interval).then_some(0)
                })
                .is_ok()
    }

    /// Replaces the connection pool with a fresh client
    ///
    /// In-flight requests finish on the old pool.
    pub fn reset_pool(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        match build_http_client(&self.config) {
            Ok(client) => {
                *self.client.write() = client;
                tracing::debug!("Connection pool reset");
            }
            Err(e) => tracing::warn!("Failed to rebuild HTTP client, keeping old pool: {}", e),
        }
    }

    /// Closes the transport; later fetches are refused
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("HTTP transport closed after {} requests", self.budget.issued());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn requests_issued(&self) -> usize {
        self.budget.issued()
    }
}
