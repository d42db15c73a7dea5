//! Admission-bounded transaction queue.
//!
//! Holds the requests waiting for the scheduler, oldest first. Admission is the controller's
//! only backpressure mechanism: once `capacity` requests are waiting, new requests are handed
//! back to the issuer, which must present them again on a later cycle.

use std::collections::VecDeque;

use super::request::Request;

/// Upper bound on entries allocated up front; deeper queues grow on demand.
const PREALLOC_ENTRIES: usize = 1 << 10;

/// A queued request plus its scheduling bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    /// The waiting request.
    pub request: Request,
    /// Number of times a younger request was scheduled ahead of this one.
    pub starvation: u64,
}

/// Ordered queue of pending requests with a capacity bound.
#[derive(Clone, Debug)]
pub struct RequestQueue {
    entries: VecDeque<QueueEntry>,
    capacity: usize,
}

impl RequestQueue {
    /// Creates an empty queue admitting at most `capacity` requests.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(PREALLOC_ENTRIES)),
            capacity,
        }
    }

    /// Admission bound.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of waiting requests.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is waiting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a new request would be rejected.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Appends `request` at the back.
    ///
    /// # Errors
    ///
    /// Hands the request back unchanged if the queue is full.
    pub fn try_enqueue(&mut self, request: Request) -> Result<(), Request> {
        if self.is_full() {
            return Err(request);
        }
        self.entries.push_back(QueueEntry {
            request,
            starvation: 0,
        });
        Ok(())
    }

    /// Re-inserts a previously admitted request at the front, as if it had never left.
    ///
    /// The capacity bound is not checked: the request already holds its admission.
    pub fn requeue_front(&mut self, request: Request) {
        self.entries.push_front(QueueEntry {
            request,
            starvation: 0,
        });
    }

    /// Removes and returns the entry at `index` (0 is the oldest).
    pub fn remove(&mut self, index: usize) -> Option<QueueEntry> {
        self.entries.remove(index)
    }

    /// Returns the entry at `index`.
    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    /// Returns the oldest entry.
    pub fn front(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    /// Iterates entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> + '_ {
        self.entries.iter()
    }

    /// Iterates the waiting requests oldest first.
    pub fn requests(&self) -> impl Iterator<Item = &Request> + '_ {
        self.entries.iter().map(|entry| &entry.request)
    }

    /// Charges one bypass to every entry ahead of `index`.
    ///
    /// Called after the entry at `index` was removed, so the entries charged are exactly
    /// those that arrived before the request that was just scheduled.
    pub fn charge_bypassed(&mut self, index: usize) {
        for entry in self.entries.iter_mut().take(index) {
            entry.starvation += 1;
        }
    }
}
