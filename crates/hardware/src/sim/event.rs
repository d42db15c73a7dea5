//! Discrete event queue.
//!
//! The controller never sleeps or waits: when it services a read from the cache it schedules a
//! response for a future cycle through [`EventScheduler`], and the driver hands the request back
//! to the controller once that cycle is reached.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::controller::request::Request;

/// Kind of scheduled event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A request is ready to be completed by the controller.
    Response,
}

/// Clock and event sink the controller runs against.
///
/// The controller is the only event target, so events carry no destination.
pub trait EventScheduler {
    /// Current simulation cycle.
    fn current_cycle(&self) -> u64;

    /// Schedules `request` to be delivered with `kind` at `at_cycle`.
    fn insert_event(&mut self, kind: EventKind, request: Request, at_cycle: u64);
}

/// A scheduled event.
#[derive(Clone, Debug)]
pub struct Event {
    /// Delivery cycle.
    pub cycle: u64,
    /// Event kind.
    pub kind: EventKind,
    /// Request carried by the event.
    pub request: Request,
    seq: u64,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.cycle, self.seq).cmp(&(other.cycle, other.seq))
    }
}

/// Min-heap of events ordered by `(cycle, insertion order)`.
#[derive(Debug, Default)]
pub struct EventQueue {
    now: u64,
    next_seq: u64,
    heap: BinaryHeap<Reverse<Event>>,
}

impl EventQueue {
    /// Creates an empty queue at cycle 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue starting at `cycle`.
    pub fn starting_at(cycle: u64) -> Self {
        Self {
            now: cycle,
            ..Self::default()
        }
    }

    /// Moves the clock forward by one cycle.
    pub fn advance(&mut self) {
        self.now += 1;
    }

    /// Moves the clock to `cycle` if it is in the future.
    pub fn advance_to(&mut self, cycle: u64) {
        self.now = self.now.max(cycle);
    }

    /// Pops the earliest event due at or before the current cycle.
    pub fn pop_due(&mut self) -> Option<Event> {
        if self.heap.peek()?.0.cycle <= self.now {
            self.heap.pop().map(|Reverse(event)| event)
        } else {
            None
        }
    }

    /// Cycle of the earliest pending event.
    pub fn next_cycle(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(event)| event.cycle)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl EventScheduler for EventQueue {
    fn current_cycle(&self) -> u64 {
        self.now
    }

    fn insert_event(&mut self, kind: EventKind, request: Request, at_cycle: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Event {
            cycle: at_cycle,
            kind,
            request,
            seq,
        }));
    }
}
