use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide request budget
///
/// Checked on the fetch admission path. Once the limit is reached every
/// further acquisition fails, and callers drop the request silently.
#[derive(Debug)]
pub struct RequestBudget {
    limit: Option<usize>,
    issued: AtomicUsize,
}

impl RequestBudget {
    /// Creates a budget; `None` means unlimited
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            issued: AtomicUsize::new(0),
        }
    }

    /// Reserves one request, returning false once the budget is spent
    pub fn try_acquire(&self) -> bool {
        match self.limit {
            None => {
                self.issued.fetch_add(1, Ordering::SeqCst);
                true
            }
            Some(limit) => self
                .issued
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |issued| {
                    (issued < limit).then_some(issued + 1)
                })
                .is_ok(),
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.issued() >= limit)
    }
}
