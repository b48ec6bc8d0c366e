use parking_lot::Mutex;
use std::collections::HashMap;

/// Exact per-URL sighting counter
///
/// Used by the output handler to tag repeated sightings of the same final
/// URL (two links redirecting to one page, for example). Unlike the
/// membership filter this never gives a false answer, and it governs what is
/// displayed rather than what is queued.
#[derive(Debug, Default)]
pub struct DuplicateVisitCounter {
    counts: Mutex<HashMap<String, usize>>,
}

impl DuplicateVisitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sighting and returns how many times the URL has now been seen
    pub fn record(&self, url: &str) -> usize {
        let mut counts = self.counts.lock();
        let count = counts.entry(url.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Returns the number of sightings recorded for a URL
    pub fn count(&self, url: &str) -> usize {
        self.counts.lock().get(url).copied().unwrap_or(0)
    }

    /// Number of distinct URLs seen
    pub fn distinct(&self) -> usize {
        self.counts.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_sightings() {
        let counter = DuplicateVisitCounter::new();
        assert_eq!(counter.record("https://example.com/"), 1);
        assert_eq!(counter.record("https://example.com/"), 2);
        assert_eq!(counter.record("https://example.com/other"), 1);

        assert_eq!(counter.count("https://example.com/"), 2);
        assert_eq!(counter.count("https://example.com/missing"), 0);
        assert_eq!(counter.distinct(), 2);
    }
}
