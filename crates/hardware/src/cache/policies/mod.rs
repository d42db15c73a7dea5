//! Cache Eviction Policies.
//!
//! Implements the algorithms that pick which resident line leaves the cache when a new line
//! must be allocated in a full cache.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used, exact order via [`RecencyTracker`](super::recency::RecencyTracker).
//! - `Random`: Uniform random choice among resident lines, driven by an injected RNG.

/// Least Recently Used eviction policy.
pub mod lru;

/// Random eviction policy.
pub mod random;

pub use lru::LruPolicy;
pub use random::RandomPolicy;

use crate::config::EvictionKind;

/// Trait for cache eviction policies.
///
/// A policy tracks exactly the set of tags resident in the cache: the engine reports every
/// allocation, access, and removal, and asks for a victim when it runs out of room.
pub trait EvictionPolicy: Send + std::fmt::Debug {
    /// Records that a new line with `tag` became resident.
    fn insert(&mut self, tag: u64);

    /// Records an access to the resident line `tag`.
    fn touch(&mut self, tag: u64);

    /// Stops tracking `tag` (invalidation). Returns false if it was not tracked.
    fn remove(&mut self, tag: u64) -> bool;

    /// Chooses a victim, stops tracking it, and returns its tag.
    ///
    /// # Returns
    ///
    /// `None` only when no tag is tracked.
    fn get_victim(&mut self) -> Option<u64>;

    /// Number of tracked tags.
    fn len(&self) -> usize;

    /// Returns true if no tag is tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every tag.
    fn clear(&mut self);
}

/// Builds the policy selected by `kind` for a cache of `capacity` lines.
///
/// # Arguments
///
/// * `kind` - Which eviction discipline to use.
/// * `capacity` - Maximum number of resident lines (used to pre-size tracking state, up to a cap).
/// * `seed` - Seed for the random policy's generator; ignored by LRU.
pub fn build(kind: EvictionKind, capacity: usize, seed: u64) -> Box<dyn EvictionPolicy> {
    let capacity = capacity.min(super::PREALLOC_LINES);
    match kind {
        EvictionKind::Lru => Box::new(LruPolicy::new(capacity)),
        EvictionKind::Random => Box::new(RandomPolicy::with_seed(capacity, seed)),
    }
}
