//! Simulator: owns the controller and the event queue side by side.
//!
//! The controller borrows the event queue as its [`EventScheduler`] for every call, so keeping
//! both here avoids threading the clock through every caller.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use super::event::{EventKind, EventQueue, EventScheduler};
use super::trace::TraceRecord;
use crate::backend::{BackingMemory, BankedMemory};
use crate::common::ControllerError;
use crate::config::Config;
use crate::controller::request::Request;
use crate::controller::{CachedController, IssueOutcome};

/// Totals from a trace replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Cycles simulated.
    pub cycles: u64,
    /// Requests accepted by the controller.
    pub accepted: u64,
    /// Requests completed.
    pub completed: u64,
    /// Times a request was turned away by a full queue.
    pub rejections: u64,
    /// True if the replay stopped at the cycle limit with work outstanding.
    pub truncated: bool,
}

/// Top-level simulator: controller + event queue.
#[derive(Debug)]
pub struct Simulator<B: BackingMemory> {
    /// The simulated controller.
    pub controller: CachedController<B>,
    events: EventQueue,
}

impl Simulator<BankedMemory> {
    /// Creates a simulator with the reference backing memory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CachedController::new(
            config.controller.clone(),
            BankedMemory::from_config(&config.memory),
        ))
    }
}

impl<B: BackingMemory> Simulator<B> {
    /// Wraps a controller; the clock starts at cycle 0.
    pub fn new(controller: CachedController<B>) -> Self {
        Self {
            controller,
            events: EventQueue::new(),
        }
    }

    /// Current cycle.
    pub fn cycle(&self) -> u64 {
        self.events.current_cycle()
    }

    /// Pending events.
    pub const fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Presents a request to the controller at the current cycle.
    ///
    /// # Errors
    ///
    /// Propagates [`CachedController::issue`] errors.
    pub fn issue(&mut self, request: Request) -> Result<IssueOutcome, ControllerError> {
        self.controller.issue(request, &mut self.events)
    }

    /// Advances the simulation by one clock cycle.
    ///
    /// Delivers due response events, runs one controller cycle, delivers any response the
    /// controller scheduled for the current cycle, then moves the clock forward.
    ///
    /// # Returns
    ///
    /// Requests completed during the cycle.
    pub fn tick(&mut self) -> Vec<Request> {
        let mut finished = Vec::new();
        self.deliver_due(&mut finished);
        finished.extend(self.controller.cycle(&mut self.events));
        self.deliver_due(&mut finished);
        self.events.advance();
        finished
    }

    fn deliver_due(&mut self, finished: &mut Vec<Request>) {
        while let Some(event) = self.events.pop_due() {
            match event.kind {
                EventKind::Response => {
                    finished.extend(
                        self.controller
                            .request_complete(event.request, &mut self.events),
                    );
                }
            }
        }
    }

    /// Returns true if no request is queued, in flight, or awaiting a response.
    pub fn is_idle(&self) -> bool {
        self.controller.is_idle() && self.events.is_empty()
    }

    /// Ticks until idle or until `max_cycles` have elapsed.
    ///
    /// # Returns
    ///
    /// Requests completed while draining.
    pub fn drain(&mut self, max_cycles: Option<u64>) -> Vec<Request> {
        let limit = max_cycles.map_or(u64::MAX, |n| self.cycle().saturating_add(n));
        let mut finished = Vec::new();
        while !self.is_idle() && self.cycle() < limit {
            finished.extend(self.tick());
        }
        finished
    }

    /// Replays a trace, presenting each request at its cycle and retrying rejected requests on
    /// later cycles in trace order, then drains.
    ///
    /// # Errors
    ///
    /// Stops at the first request the controller refuses outright.
    pub fn replay(
        &mut self,
        records: impl IntoIterator<Item = TraceRecord>,
        max_cycles: Option<u64>,
    ) -> Result<RunSummary, ControllerError> {
        let mut pending: VecDeque<TraceRecord> = records.into_iter().collect();
        let start = self.cycle();
        let limit = max_cycles.map_or(u64::MAX, |n| start.saturating_add(n));
        let mut summary = RunSummary::default();

        while (!pending.is_empty() || !self.is_idle()) && self.cycle() < limit {
            let now = self.cycle();
            while let Some(record) = pending.pop_front() {
                if record.cycle > now {
                    pending.push_front(record);
                    break;
                }
                let cycle = record.cycle;
                match self.issue(record.request)? {
                    IssueOutcome::Rejected(request) => {
                        summary.rejections += 1;
                        pending.push_front(TraceRecord { cycle, request });
                        break;
                    }
                    IssueOutcome::Enqueued | IssueOutcome::ServicedFromCache => summary.accepted += 1,
                }
            }
            summary.completed += self.tick().len() as u64;
        }

        summary.cycles = self.cycle() - start;
        summary.truncated = !pending.is_empty() || !self.is_idle();
        debug!(
            "replay finished after {} cycles: {} completed, {} rejections",
            summary.cycles, summary.completed, summary.rejections
        );
        Ok(summary)
    }
}
