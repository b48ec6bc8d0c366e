//! Append-only URL registries shared across workers
//!
//! - `DangerousUrlRegistry`: URLs skipped because they matched a danger keyword
//! - `ExternalLedger`: external URLs discovered vs. actually visited

use parking_lot::Mutex;
use std::collections::HashSet;

/// Deduplicated list that remembers first-insertion order
#[derive(Debug, Default)]
struct OrderedSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, value: &str) -> bool {
        if self.seen.contains(value) {
            return false;
        }
        self.seen.insert(value.to_string());
        self.ordered.push(value.to_string());
        true
    }
}

/// Process-wide record of URLs that matched a danger keyword
///
/// Each URL appears once no matter how many pages link to it.
#[derive(Debug, Default)]
pub struct DangerousUrlRegistry {
    inner: Mutex<OrderedSet>,
}

impl DangerousUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL, returning true the first time it is seen
    pub fn record(&self, url: &str) -> bool {
        let added = self.inner.lock().insert(url);
        if added {
            tracing::debug!("Dangerous URL recorded: {}", url);
        }
        added
    }

    pub fn contains(&self, url: &str) -> bool {
        self.inner.lock().seen.contains(url)
    }

    /// URLs in the order they were first recorded
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().ordered.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tracks external URLs from discovery to visit
#[derive(Debug, Default)]
pub struct ExternalLedger {
    inner: Mutex<LedgerInner>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    discovered: OrderedSet,
    visited: HashSet<String>,
}

impl ExternalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an external URL, returning true the first time it is seen
    pub fn record_discovered(&self, url: &str) -> bool {
        self.inner.lock().discovered.insert(url)
    }

    pub fn mark_visited(&self, url: &str) {
        self.inner.lock().visited.insert(url.to_string());
    }

    pub fn discovered_count(&self) -> usize {
        self.inner.lock().discovered.ordered.len()
    }

    /// Discovered URLs that were never fetched, in discovery order
    pub fn unvisited(&self) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .discovered
            .ordered
            .iter()
            .filter(|url| !inner.visited.contains(*url))
            .cloned()
            .collect()
    }
}
