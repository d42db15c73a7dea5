//! First-ready, first-come-first-served request selection.
//!
//! Each cycle the scheduler picks at most one queued request. Rules are tried in strict
//! priority order and the first match wins; every rule scans the whole queue oldest first:
//! 1. **Starved:** bypassed more than `starvation_threshold` times, bank ready.
//! 2. **Row-buffer hit:** row open in its bank, bank ready.
//! 3. **Cache-resident read:** whole range present in the front-end cache.
//! 4. **Write-stalled read:** oldest read waiting behind an older overlapping write; the
//!    blocking write is selected so the read can follow.
//! 5. **Oldest ready:** bank has some row open, bank ready.
//! 6. **Closed bank:** any request whose bank is ready.
//!
//! A request with an older overlapping write still queued is hazard-blocked and is never
//! chosen by rules 1, 2, 5 or 6.

use std::fmt;

use tracing::trace;

use super::queue::{QueueEntry, RequestQueue};
use crate::backend::BackingMemory;
use crate::cache::CacheEngine;

/// The rule that produced a selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulingRule {
    /// Starved request forced ahead of everything else.
    Starved,
    /// Open-row access.
    RowBufferHit,
    /// Read serviced from the front-end cache.
    CacheResident,
    /// Write drained so a read behind it can proceed.
    WriteStalledRead,
    /// Oldest request to a bank with an open row.
    OldestReady,
    /// Oldest request to any ready bank.
    ClosedBank,
}

impl SchedulingRule {
    /// Returns true if the selected request goes to the cache rather than the backing memory.
    #[inline]
    pub const fn uses_cache(self) -> bool {
        matches!(self, Self::CacheResident)
    }
}

impl fmt::Display for SchedulingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starved => "starved",
            Self::RowBufferHit => "row-hit",
            Self::CacheResident => "cached",
            Self::WriteStalledRead => "write-stalled",
            Self::OldestReady => "oldest-ready",
            Self::ClosedBank => "closed-bank",
        };
        f.write_str(name)
    }
}

/// Result of one scheduling decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Queue position of the selected request (0 is the oldest).
    pub index: usize,
    /// Rule that matched.
    pub rule: SchedulingRule,
}

/// Per-entry facts gathered once per decision.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    blocked_by: Option<usize>,
    ready: bool,
}

/// FR-FCFS selection policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduler {
    starvation_threshold: u64,
}

impl Scheduler {
    /// Creates a scheduler that forces a request after it was bypassed more than
    /// `starvation_threshold` times.
    pub const fn new(starvation_threshold: u64) -> Self {
        Self {
            starvation_threshold,
        }
    }

    /// Bypass count above which a request is starved.
    #[inline]
    pub const fn starvation_threshold(&self) -> u64 {
        self.starvation_threshold
    }

    /// Picks the next request to dispatch, or `None` for an idle cycle.
    ///
    /// # Arguments
    ///
    /// * `queue` - Pending requests, oldest first.
    /// * `cache` - Front-end cache, consulted for cache-resident reads.
    /// * `memory` - Backing memory, consulted for row and bank state.
    /// * `cycle` - Current cycle.
    pub fn select<B>(
        &self,
        queue: &RequestQueue,
        cache: &CacheEngine,
        memory: &B,
        cycle: u64,
    ) -> Option<Selection>
    where
        B: BackingMemory + ?Sized,
    {
        let candidates = Self::candidates(queue, memory, cycle);
        let free = |index: usize| {
            let c = candidates[index];
            c.ready && c.blocked_by.is_none()
        };

        let threshold = self.starvation_threshold;
        let selection = Self::find(queue, SchedulingRule::Starved, |i, entry| {
            free(i) && entry.starvation > threshold
        })
        .or_else(|| {
            Self::find(queue, SchedulingRule::RowBufferHit, |i, entry| {
                free(i) && memory.is_row_hit(&entry.request)
            })
        })
        .or_else(|| {
            Self::find(queue, SchedulingRule::CacheResident, |i, entry| {
                let request = &entry.request;
                candidates[i].blocked_by.is_none()
                    && request.is_read()
                    && cache.has_data(request.addr(), request.size)
            })
        })
        .or_else(|| Self::write_stalled(queue, &candidates))
        .or_else(|| {
            Self::find(queue, SchedulingRule::OldestReady, |i, entry| {
                free(i) && memory.is_bank_open(&entry.request)
            })
        })
        .or_else(|| Self::find(queue, SchedulingRule::ClosedBank, |i, _| free(i)));

        if let Some(s) = selection {
            trace!("cycle {cycle}: selected queue[{}] by {}", s.index, s.rule);
        }
        selection
    }

    fn candidates<B>(queue: &RequestQueue, memory: &B, cycle: u64) -> Vec<Candidate>
    where
        B: BackingMemory + ?Sized,
    {
        let requests: Vec<_> = queue.requests().collect();
        requests
            .iter()
            .enumerate()
            .map(|(i, request)| Candidate {
                blocked_by: requests[..i]
                    .iter()
                    .position(|older| older.is_write() && older.overlaps(request)),
                ready: memory.can_accept(request, cycle),
            })
            .collect()
    }

    fn find<F>(queue: &RequestQueue, rule: SchedulingRule, mut matches: F) -> Option<Selection>
    where
        F: FnMut(usize, &QueueEntry) -> bool,
    {
        queue
            .iter()
            .enumerate()
            .find(|&(i, entry)| matches(i, entry))
            .map(|(index, _)| Selection { index, rule })
    }

    fn write_stalled(queue: &RequestQueue, candidates: &[Candidate]) -> Option<Selection> {
        let blocker = queue
            .requests()
            .zip(candidates)
            .find_map(|(request, c)| if request.is_read() { c.blocked_by } else { None })?;
        let write = candidates[blocker];
        (write.ready && write.blocked_by.is_none()).then_some(Selection {
            index: blocker,
            rule: SchedulingRule::WriteStalledRead,
        })
    }
}
