//! Byte-Addressable Front-End Cache.
//!
//! This module implements the data cache that sits in front of the backing memory model.
//! Unlike a tag-only timing cache it stores real bytes with a validity bit per byte, so a
//! partially written line can serve exactly the bytes it has seen. It provides:
//! 1. **Presence checks:** Whether an arbitrary byte range is fully resident and valid.
//! 2. **Reads/Writes:** Multi-line byte range access with per-byte validity.
//! 3. **Eviction:** A pluggable [`EvictionPolicy`] consulted when the cache is full.
//! 4. **Invalidation:** Whole-line removal of resident lines.
//!
//! The cache is fully associative: any tag may occupy any of the `max_lines` slots.

/// Byte-granular cache line storage.
pub mod line;

/// Eviction policy implementations (LRU, Random).
pub mod policies;

/// Recency tracking for the LRU policy.
pub mod recency;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use self::line::CacheLine;
use self::policies::EvictionPolicy;
use crate::common::{AddressDecoder, CacheError};
use crate::config::ControllerConfig;

/// Upper bound on tracking state allocated up front; larger caches grow on demand.
const PREALLOC_LINES: usize = 1 << 12;

/// Counters maintained by the cache engine itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lines allocated by writes or fills.
    pub fills: u64,
    /// Lines removed to make room for a new line.
    pub evictions: u64,
    /// Lines removed by explicit invalidation.
    pub invalidations: u64,
}

/// Fully associative byte-addressable cache with a pluggable eviction policy.
#[derive(Debug)]
pub struct CacheEngine {
    lines: HashMap<u64, CacheLine>,
    decoder: AddressDecoder,
    max_lines: usize,
    latency: u64,
    policy: Box<dyn EvictionPolicy>,
    stats: CacheStats,
}

impl CacheEngine {
    /// Creates a cache engine.
    ///
    /// # Arguments
    ///
    /// * `max_lines` - Capacity in lines; a capacity of zero is treated as one line.
    /// * `line_bytes` - Line size in bytes.
    /// * `latency` - Cycles to service a hit.
    /// * `policy` - Eviction policy; must start empty.
    pub fn new(
        max_lines: usize,
        line_bytes: usize,
        latency: u64,
        policy: Box<dyn EvictionPolicy>,
    ) -> Self {
        let max_lines = max_lines.max(1);
        Self {
            lines: HashMap::with_capacity(max_lines.min(PREALLOC_LINES)),
            decoder: AddressDecoder::new(line_bytes),
            max_lines,
            latency,
            policy,
            stats: CacheStats::default(),
        }
    }

    /// Creates the cache described by a controller configuration.
    ///
    /// Capacity is `2^cache_size_exponent` lines and the eviction policy is chosen by
    /// `eviction`, seeded with `eviction_seed`.
    pub fn from_config(config: &ControllerConfig) -> Self {
        let max_lines = config.max_lines();
        let policy = policies::build(config.eviction, max_lines, config.eviction_seed);
        Self::new(
            max_lines,
            config.cache_line_bytes,
            config.cache_latency,
            policy,
        )
    }

    /// Cycles needed to service a hit.
    #[inline]
    pub const fn latency(&self) -> u64 {
        self.latency
    }

    /// Maximum number of resident lines.
    #[inline]
    pub const fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Number of resident lines.
    #[inline]
    pub fn current_size(&self) -> usize {
        self.lines.len()
    }

    /// Line size in bytes.
    #[inline]
    pub const fn line_bytes(&self) -> usize {
        self.decoder.line_bytes()
    }

    /// Address decoder used by this cache.
    #[inline]
    pub const fn decoder(&self) -> &AddressDecoder {
        &self.decoder
    }

    /// Engine-level counters.
    #[inline]
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Eviction policy state.
    pub fn policy(&self) -> &dyn EvictionPolicy {
        self.policy.as_ref()
    }

    /// Returns true if the line holding `address` is resident, whatever its validity.
    pub fn contains_line(&self, address: u64) -> bool {
        self.lines.contains_key(&self.decoder.tag(address))
    }

    /// Returns the resident line holding `address`.
    pub fn line(&self, address: u64) -> Option<&CacheLine> {
        self.lines.get(&self.decoder.tag(address))
    }

    /// Checks whether every byte of `[address, address + size)` is resident and valid.
    ///
    /// An empty range is trivially present. Recency is not updated.
    pub fn has_data(&self, address: u64, size: usize) -> bool {
        self.decoder.segments(address, size).all(|seg| {
            self.lines
                .get(&seg.tag)
                .is_some_and(|line| line.is_valid(seg.offset, seg.len))
        })
    }

    /// Reads `size` bytes starting at `address`.
    ///
    /// Never fails: bytes of absent lines and invalid slots read as zero. Every resident
    /// line touched becomes most recently used.
    ///
    /// # Returns
    ///
    /// An owned buffer of exactly `size` bytes.
    pub fn read_data(&mut self, address: u64, size: usize) -> Vec<u8> {
        let mut out = vec![0; size];
        for seg in self.decoder.segments(address, size) {
            if let Some(line) = self.lines.get(&seg.tag) {
                line.read_into(seg.offset, &mut out[seg.start..seg.start + seg.len]);
                self.policy.touch(seg.tag);
            }
        }
        out
    }

    /// Writes the first `size` bytes of `data` starting at `address`.
    ///
    /// Resident lines have only the covered slots overwritten. Missing lines are allocated
    /// all-invalid and then filled, evicting exactly one victim first if the cache is full.
    ///
    /// # Errors
    ///
    /// [`CacheError::PayloadTooShort`] if `data` holds fewer than `size` bytes; the cache is
    /// left untouched.
    pub fn write_data(&mut self, address: u64, data: &[u8], size: usize) -> Result<(), CacheError> {
        self.store(address, data, size, CacheLine::write)
    }

    /// Fills `[address, address + size)` from memory without overwriting valid bytes.
    ///
    /// Bytes already valid in the cache are at least as new as the backing memory's copy, so
    /// only invalid slots take the value from `data`. Missing lines are allocated as in
    /// [`CacheEngine::write_data`].
    ///
    /// # Errors
    ///
    /// [`CacheError::PayloadTooShort`] if `data` holds fewer than `size` bytes; the cache is
    /// left untouched.
    pub fn fill_data(&mut self, address: u64, data: &[u8], size: usize) -> Result<(), CacheError> {
        self.store(address, data, size, CacheLine::fill)
    }

    fn store(
        &mut self,
        address: u64,
        data: &[u8],
        size: usize,
        apply: fn(&mut CacheLine, usize, &[u8]),
    ) -> Result<(), CacheError> {
        if data.len() < size {
            return Err(CacheError::PayloadTooShort {
                address,
                size,
                available: data.len(),
            });
        }

        let line_bytes = self.decoder.line_bytes();
        for seg in self.decoder.segments(address, size) {
            let bytes = &data[seg.start..seg.start + seg.len];
            if let Some(line) = self.lines.get_mut(&seg.tag) {
                apply(line, seg.offset, bytes);
                self.policy.touch(seg.tag);
                continue;
            }

            if self.lines.len() >= self.max_lines {
                self.evict_one();
            }
            let mut line = CacheLine::new(line_bytes);
            line.write(seg.offset, bytes);
            let _ = self.lines.insert(seg.tag, line);
            self.policy.insert(seg.tag);
            self.stats.fills += 1;
        }
        Ok(())
    }

    /// Removes every resident line overlapping `[address, address + size)`.
    ///
    /// A `size` of zero targets the single line holding `address`.
    ///
    /// # Returns
    ///
    /// `false` if none of the targeted lines was resident.
    pub fn invalidate_data(&mut self, address: u64, size: usize) -> bool {
        let size = size.max(1);
        let tags: Vec<u64> = self
            .decoder
            .segments(address, size)
            .map(|seg| seg.tag)
            .collect();
        let mut removed = false;
        for tag in tags {
            if self.lines.remove(&tag).is_some() {
                let _ = self.policy.remove(tag);
                self.stats.invalidations += 1;
                removed = true;
            }
        }
        removed
    }

    /// Drops every resident line.
    pub fn flush(&mut self) {
        self.lines.clear();
        self.policy.clear();
    }

    fn evict_one(&mut self) {
        match self.policy.get_victim() {
            Some(victim) => {
                if self.lines.remove(&victim).is_some() {
                    self.stats.evictions += 1;
                    debug!("evicted line {victim:#x}");
                }
            }
            None => debug!("eviction requested with no tracked lines"),
        }
    }
}
