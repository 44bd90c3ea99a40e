// src/crawl/dedup.rs
// =============================================================================
// The dedup filter: "have we already seen this URL?"
//
// URLs are stored as 64-bit xxh3 fingerprints rather than strings. Two
// different URLs that hash to the same value count as the same URL; at
// 64 bits that is rare enough to accept as a dedup inaccuracy.
//
// The set only grows. Nothing is ever removed.
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashSet;
use xxhash_rust::xxh3::xxh3_64;

/// 64-bit fingerprint of a canonical URL.
pub fn fingerprint(url: &str) -> u64 {
    xxh3_64(url.as_bytes())
}

#[derive(Debug, Default)]
pub struct DedupFilter {
    seen: Mutex<HashSet<u64>>,
}

impl DedupFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: Mutex::new(HashSet::with_capacity(capacity)),
        }
    }

    /// Records `url`. Returns false if its fingerprint was already present.
    pub fn add(&self, url: &str) -> bool {
        self.seen.lock().insert(fingerprint(url))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.lock().contains(&fingerprint(url))
    }

    /// Number of distinct fingerprints.
    pub fn size(&self) -> usize {
        self.seen.lock().len()
    }
}
