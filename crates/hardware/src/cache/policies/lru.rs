//! Least Recently Used (LRU) Eviction Policy.
//!
//! This policy evicts the line that has not been read or written for the longest time.
//! Every access moves the line to the most-recently-used end of a
//! [`RecencyTracker`]; the victim is always the tag at the other end.
//!
//! # Performance
//!
//! - **Time Complexity:** O(1) amortised for `touch()`, `insert()`, `remove()`, `get_victim()`
//! - **Space Complexity:** O(N) where N is the number of resident lines
//! - **Best Case:** Reuse distances shorter than the cache capacity
//! - **Worst Case:** Cyclic scans larger than the cache (every access misses)

use super::EvictionPolicy;
use crate::cache::recency::RecencyTracker;

/// LRU Policy state.
#[derive(Clone, Debug, Default)]
pub struct LruPolicy {
    recency: RecencyTracker,
}

impl LruPolicy {
    /// Creates a new LRU policy sized for `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            recency: RecencyTracker::with_capacity(capacity),
        }
    }

    /// Returns the recency order, most recently used first.
    pub fn order(&self) -> Vec<u64> {
        self.recency.iter().collect()
    }
}

impl EvictionPolicy for LruPolicy {
    fn insert(&mut self, tag: u64) {
        self.recency.touch(tag);
    }

    /// Moves `tag` to the most-recently-used position.
    fn touch(&mut self, tag: u64) {
        self.recency.touch(tag);
    }

    fn remove(&mut self, tag: u64) -> bool {
        self.recency.remove(tag)
    }

    /// Returns the tag at the least-recently-used end.
    fn get_victim(&mut self) -> Option<u64> {
        self.recency.evict_lru()
    }

    fn len(&self) -> usize {
        self.recency.len()
    }

    fn clear(&mut self) {
        self.recency.clear();
    }
}
