//! Work queue with join semantics
//!
//! Workers pop with a bounded wait so they can notice a stop request. The
//! queue tracks a pending count that rises on `push` and falls on
//! `task_done`, so `join` resolves only once every pushed item has been
//! fully processed, including anything those items pushed in turn.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use url::Url;

/// A URL waiting to be fetched, with its distance from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: Url,
    pub depth: u32,
}

impl WorkItem {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// FIFO queue shared by a worker pool
#[derive(Debug)]
pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
    available: Notify,
    pending: watch::Sender<usize>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            pending,
        }
    }

    /// Adds an item and counts it as pending until `task_done`
    pub fn push(&self, item: WorkItem) {
        self.pending.send_modify(|n| *n += 1);
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    /// Takes the next item, waiting up to `wait` for one to arrive
    pub async fn pop(&self, wait: Duration) -> Option<WorkItem> {
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            if let Some(item) = self.items.lock().pop_front() {
                return Some(item);
            }

            if tokio::time::timeout_at(deadline, self.available.notified())
                .await
                .is_err()
            {
                return self.items.lock().pop_front();
            }
        }
    }

    /// Marks one popped item as fully processed
    pub fn task_done(&self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Marks one popped item as done when the guard drops
    ///
    /// Holding the guard across processing keeps the pending count right even
    /// if processing panics and the worker task unwinds.
    pub fn done_guard(&self) -> TaskGuard<'_> {
        TaskGuard { queue: self }
    }

    /// Waits until every pushed item has been marked done
    pub async fn join(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Items pushed but not yet marked done
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Items waiting to be popped
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Calls [`WorkQueue::task_done`] on drop
#[derive(Debug)]
pub struct TaskGuard<'a> {
    queue: &'a WorkQueue,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.queue.task_done();
    }
}
