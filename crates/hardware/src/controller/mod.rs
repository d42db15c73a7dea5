//! Cached FR-FCFS memory controller.
//!
//! This module implements the controller front end that sits between request issuers and a
//! [`BackingMemory`]. It provides:
//! 1. **Admission:** [`CachedController::issue`] accepts requests into a bounded queue, serves
//!    reads that hit the front-end cache immediately, and mirrors writes into the cache.
//! 2. **Scheduling:** [`CachedController::cycle`] dispatches at most one request per cycle
//!    using the rules in [`scheduler`].
//! 3. **Completion:** [`CachedController::request_complete`] requeues writes the backing memory
//!    asked to retry, refills the cache, and records latency statistics.

/// Bounded transaction queue.
pub mod queue;

/// Memory request types.
pub mod request;

/// Six-rule request selection.
pub mod scheduler;

use tracing::{debug, info, trace, warn};

use self::queue::RequestQueue;
use self::request::{Request, RequestKind, RequestStatus};
use self::scheduler::{Scheduler, SchedulingRule, Selection};
use crate::backend::BackingMemory;
use crate::cache::CacheEngine;
use crate::common::ControllerError;
use crate::config::ControllerConfig;
use crate::sim::event::{EventKind, EventScheduler};
use crate::stats::{ControllerStats, StatsSink};

/// What happened to a request presented to [`CachedController::issue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueOutcome {
    /// Read hit in the front-end cache; a response event was scheduled.
    ServicedFromCache,
    /// Accepted into the transaction queue.
    Enqueued,
    /// Queue full; the request is handed back and must be presented again later.
    Rejected(Request),
}

impl IssueOutcome {
    /// Returns true unless the request was rejected.
    #[inline]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// FR-FCFS memory controller with a byte-addressable front-end cache.
#[derive(Debug)]
pub struct CachedController<B: BackingMemory> {
    config: ControllerConfig,
    cache: CacheEngine,
    queue: RequestQueue,
    scheduler: Scheduler,
    memory: B,
    stats: ControllerStats,
}

impl<B: BackingMemory> CachedController<B> {
    /// Creates a controller in front of `memory`, building the cache from `config`.
    pub fn new(config: ControllerConfig, memory: B) -> Self {
        let cache = CacheEngine::from_config(&config);
        Self::with_cache(config, cache, memory)
    }

    /// Creates a controller around a pre-built cache engine.
    ///
    /// The cache's own geometry takes precedence over the cache settings in `config`.
    pub fn with_cache(config: ControllerConfig, cache: CacheEngine, memory: B) -> Self {
        info!(
            "controller: queue {} entries, starvation threshold {}, cache {} x {} B lines ({:?})",
            config.queue_size,
            config.starvation_threshold,
            cache.max_lines(),
            cache.line_bytes(),
            config.eviction
        );
        Self {
            queue: RequestQueue::new(config.queue_size),
            scheduler: Scheduler::new(config.starvation_threshold),
            config,
            cache,
            memory,
            stats: ControllerStats::default(),
        }
    }

    /// Returns true if `issue` would accept a request now.
    pub fn is_issuable(&self, _request: &Request) -> bool {
        !self.queue.is_full()
    }

    /// Presents a request to the controller.
    ///
    /// Stamps `arrival_cycle`. Reads fully present in the cache are answered through a
    /// [`EventKind::Response`] event `cache latency` cycles later; every other accepted request
    /// is queued. Writes carrying a payload are mirrored into the cache immediately.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Cache`] if a write's payload is shorter than its declared size. The
    /// request is not queued and the cache is left untouched.
    pub fn issue(
        &mut self,
        mut request: Request,
        events: &mut dyn EventScheduler,
    ) -> Result<IssueOutcome, ControllerError> {
        if !self.is_issuable(&request) {
            debug!("queue full, rejecting {request}");
            return Ok(IssueOutcome::Rejected(request));
        }

        let now = events.current_cycle();
        request.arrival_cycle = now;

        if request.is_read() {
            self.stats.cache_tries += 1;
            if self.cache.has_data(request.addr(), request.size) {
                self.stats.mem_reads += 1;
                self.stats.cache_hits += 1;
                request.payload = Some(self.cache.read_data(request.addr(), request.size));
                request.issue_cycle = now;
                request.status = RequestStatus::Issued;
                trace!("cache hit {request}");
                let at = now + self.cache.latency();
                events.insert_event(EventKind::Response, request, at);
                return Ok(IssueOutcome::ServicedFromCache);
            }
        } else if let Some(data) = request.payload.as_deref() {
            self.cache
                .write_data(request.addr(), data, request.size)
                .map_err(|source| ControllerError::Cache {
                    id: request.id,
                    source,
                })?;
            self.stats.cache_writes += 1;
        }

        let is_read = request.is_read();
        if let Err(request) = self.queue.try_enqueue(request) {
            return Ok(IssueOutcome::Rejected(request));
        }
        if is_read {
            self.stats.mem_reads += 1;
        } else {
            self.stats.mem_writes += 1;
        }
        Ok(IssueOutcome::Enqueued)
    }

    /// Advances the controller by one cycle.
    ///
    /// Dispatches at most one queued request, advances the backing memory, and completes
    /// whatever it finished.
    ///
    /// # Returns
    ///
    /// Requests that completed through the backing memory this cycle. Cache-serviced requests
    /// complete later through their response events.
    pub fn cycle(&mut self, events: &mut dyn EventScheduler) -> Vec<Request> {
        let now = events.current_cycle();
        if let Some(selection) = self
            .scheduler
            .select(&self.queue, &self.cache, &self.memory, now)
        {
            self.dispatch(selection, events);
        }

        self.memory
            .cycle(now)
            .into_iter()
            .filter_map(|request| self.request_complete(request, events))
            .collect()
    }

    /// Finishes a request coming back from the backing memory or a response event.
    ///
    /// Writes flagged `cancelled` or `paused` go back to the front of the queue unchanged.
    /// Anything else is marked complete; operations other than a plain write refill the cache
    /// with their payload, and the three latency averages are updated. The refill only fills
    /// bytes the cache does not already hold, so data mirrored by a younger write survives.
    ///
    /// # Returns
    ///
    /// The finished request, or `None` if it was requeued.
    pub fn request_complete(
        &mut self,
        mut request: Request,
        events: &mut dyn EventScheduler,
    ) -> Option<Request> {
        if request.needs_retry() {
            debug!("requeueing {request}");
            self.queue.requeue_front(request);
            return None;
        }

        let now = events.current_cycle();
        request.status = RequestStatus::Complete;
        request.completion_cycle = now;

        if request.kind != RequestKind::Write {
            if let Some(data) = request.payload.as_deref() {
                if let Err(err) = self.cache.fill_data(request.addr(), data, request.size) {
                    warn!("skipping cache refill for {request}: {err}");
                }
            }
        }

        self.stats
            .record_latencies(request.arrival_cycle, request.issue_cycle, now);
        trace!("completed {request} at {now}");
        Some(request)
    }

    fn dispatch(&mut self, selection: Selection, events: &mut dyn EventScheduler) {
        let Some(entry) = self.queue.remove(selection.index) else {
            return;
        };
        self.queue.charge_bypassed(selection.index);

        match selection.rule {
            SchedulingRule::Starved => {
                self.stats.rb_miss += 1;
                self.stats.starvation_precharges += 1;
            }
            SchedulingRule::RowBufferHit => self.stats.rb_hits += 1,
            SchedulingRule::CacheResident => {}
            SchedulingRule::WriteStalledRead => self.stats.write_pauses += 1,
            SchedulingRule::OldestReady | SchedulingRule::ClosedBank => self.stats.rb_miss += 1,
        }

        let now = events.current_cycle();
        let mut request = entry.request;
        request.issue_cycle = now;
        request.status = RequestStatus::Issued;

        if selection.rule.uses_cache() {
            request.payload = Some(self.cache.read_data(request.addr(), request.size));
            let at = now + self.cache.latency();
            events.insert_event(EventKind::Response, request, at);
        } else {
            request.cancelled = false;
            request.paused = false;
            self.memory.issue_memory_commands(request, now);
        }
    }

    /// Returns true if nothing is queued or in flight in the backing memory.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.memory.in_flight() == 0
    }

    /// Controller configuration.
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Front-end cache.
    pub const fn cache(&self) -> &CacheEngine {
        &self.cache
    }

    /// Mutable access to the front-end cache (invalidation, flushing).
    pub const fn cache_mut(&mut self) -> &mut CacheEngine {
        &mut self.cache
    }

    /// Transaction queue.
    pub const fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Backing memory.
    pub const fn memory(&self) -> &B {
        &self.memory
    }

    /// Mutable access to the backing memory.
    pub const fn memory_mut(&mut self) -> &mut B {
        &mut self.memory
    }

    /// Controller statistics.
    pub const fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    /// Writes the controller statistics into `sink`.
    pub fn register_stats(&self, sink: &mut dyn StatsSink) {
        self.stats.register(sink);
    }
}

impl<B: BackingMemory> Drop for CachedController<B> {
    fn drop(&mut self) {
        info!(
            "controller shut down with {} requests queued, {} in flight",
            self.queue.len(),
            self.memory.in_flight()
        );
    }
}
