//! Random Eviction Policy.
//!
//! This policy evicts a uniformly chosen resident line. Resident tags live in a dense array
//! (one slot per line, filled in allocation order) with a hash index for O(1) removal; the
//! victim slot is drawn from an injected random number generator so runs are reproducible.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use super::EvictionPolicy;

/// Random Policy state.
#[derive(Clone, Debug)]
pub struct RandomPolicy<R = StdRng> {
    /// Resident tags, densely packed.
    slots: Vec<u64>,
    /// Tag to index in `slots`.
    index: HashMap<u64, usize>,
    rng: R,
}

impl RandomPolicy<StdRng> {
    /// Creates a random policy for `capacity` lines with a seeded standard generator.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> RandomPolicy<R> {
    /// Creates a random policy drawing victims from `rng`.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of resident lines (pre-sizes the slot array).
    /// * `rng` - Source of randomness; tests pass a fixed-seed or scripted generator.
    pub fn with_rng(capacity: usize, rng: R) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            rng,
        }
    }

    /// Resident tags in slot order.
    pub fn slots(&self) -> &[u64] {
        &self.slots
    }

    fn remove_slot(&mut self, slot: usize) -> u64 {
        let tag = self.slots.swap_remove(slot);
        let _ = self.index.remove(&tag);
        if let Some(&moved) = self.slots.get(slot) {
            let _ = self.index.insert(moved, slot);
        }
        tag
    }
}

impl<R: RngCore + Send + std::fmt::Debug> EvictionPolicy for RandomPolicy<R> {
    fn insert(&mut self, tag: u64) {
        if self.index.contains_key(&tag) {
            return;
        }
        let _ = self.index.insert(tag, self.slots.len());
        self.slots.push(tag);
    }

    /// Access patterns do not influence random eviction.
    fn touch(&mut self, _tag: u64) {}

    fn remove(&mut self, tag: u64) -> bool {
        match self.index.get(&tag) {
            Some(&slot) => {
                let _ = self.remove_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Draws a slot uniformly from the resident lines.
    fn get_victim(&mut self) -> Option<u64> {
        if self.slots.is_empty() {
            return None;
        }
        let slot = self.rng.gen_range(0..self.slots.len());
        Some(self.remove_slot(slot))
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }
}
