//! Approximate "already seen" set shared by every worker
//!
//! A classic bloom filter over URL strings: inserts only, no deletes, and a
//! bounded false-positive rate in exchange for a fixed memory footprint. A
//! false positive means a URL that was never queued is treated as seen and
//! skipped for the rest of the run. A false negative never happens.

use crate::ConfigError;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::f64::consts::LN_2;

/// Upper bound on hash functions; beyond this the extra work buys nothing
const MAX_HASHES: u32 = 32;

/// Thread-safe bloom filter sized once at construction
#[derive(Debug)]
pub struct MembershipFilter {
    bits: Mutex<BitSet>,
    num_bits: u64,
    num_hashes: u32,
}

#[derive(Debug)]
struct BitSet {
    words: Vec<u64>,
    inserted: usize,
}

impl BitSet {
    fn get(&self, index: u64) -> bool {
        let word = (index / 64) as usize;
        self.words[word] & (1u64 << (index % 64)) != 0
    }

    fn set(&mut self, index: u64) {
        let word = (index / 64) as usize;
        self.words[word] |= 1u64 << (index % 64);
    }
}

impl MembershipFilter {
    /// Creates a filter for `expected_items` entries at the target
    /// `false_positive_rate`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` when `expected_items` is zero or the
    /// rate is outside `(0, 1)`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Result<Self, ConfigError> {
        if expected_items == 0 {
            return Err(ConfigError::Validation(
                "membership filter needs at least one expected item".to_string(),
            ));
        }
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(ConfigError::Validation(format!(
                "false positive rate must be in (0, 1), got {}",
                false_positive_rate
            )));
        }

        let n = expected_items as f64;
        let m = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil().max(64.0);
        let num_bits = m as u64;
        let num_hashes = ((m / n) * LN_2).round().clamp(1.0, MAX_HASHES as f64) as u32;
        let words = num_bits.div_ceil(64) as usize;

        tracing::debug!(
            "Membership filter sized at {} bits with {} hashes for {} items",
            num_bits,
            num_hashes,
            expected_items
        );

        Ok(Self {
            bits: Mutex::new(BitSet {
                words: vec![0; words],
                inserted: 0,
            }),
            num_bits,
            num_hashes,
        })
    }

    /// Inserts an item, returning true if it was not already present
    ///
    /// The check and the insert happen under one lock, so two workers racing
    /// on the same URL cannot both see it as new.
    pub fn insert(&self, item: &str) -> bool {
        let indexes = self.indexes(item);
        let mut bits = self.bits.lock();

        let mut was_new = false;
        for &index in &indexes {
            if !bits.get(index) {
                was_new = true;
                bits.set(index);
            }
        }
        if was_new {
            bits.inserted += 1;
        }
        was_new
    }

    /// Returns true if the item may have been inserted
    pub fn contains(&self, item: &str) -> bool {
        let indexes = self.indexes(item);
        let bits = self.bits.lock();
        indexes.iter().all(|&index| bits.get(index))
    }

    /// Number of items that were new when inserted
    pub fn len(&self) -> usize {
        self.bits.lock().inserted
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Double hashing over the two halves of a SHA-256 digest
    fn indexes(&self, item: &str) -> Vec<u64> {
        let digest = Sha256::digest(item.as_bytes());
        let mut first = [0u8; 8];
        let mut second = [0u8; 8];
        first.copy_from_slice(&digest[0..8]);
        second.copy_from_slice(&digest[8..16]);

        let h1 = u64::from_le_bytes(first);
        let h2 = u64::from_le_bytes(second) | 1;

        (0..self.num_hashes as u64)
            .map(|i| h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits)
            .collect()
    }
}
