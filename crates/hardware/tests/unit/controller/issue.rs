//! Request Admission Tests.
//!
//! Verifies `CachedController::issue`: capacity rejection, arrival stamping, the cache fast
//! path for reads, write-through mirroring, the traffic counters, and the short-payload error.

use memsched_core::common::{CacheError, ControllerError};
use memsched_core::controller::request::{Request, RequestKind, RequestStatus};
use memsched_core::controller::{CachedController, IssueOutcome};
use memsched_core::sim::event::EventKind;
use pretty_assertions::assert_eq;

use crate::common::harness::{TestContext, test_config};
use crate::common::mocks::events::MockEvents;
use crate::common::mocks::memory::ScriptedMemory;

fn controller() -> CachedController<ScriptedMemory> {
    CachedController::new(test_config(), ScriptedMemory::new(10))
}

fn clock_at(cycle: u64) -> MockEvents {
    let mut events = MockEvents::new();
    events.expect_current_cycle().return_const(cycle);
    events
}

// ══════════════════════════════════════════════════════════
// 1. Admission control
// ══════════════════════════════════════════════════════════

#[test]
fn queue_size_plus_one_yields_one_rejection() {
    let mut config = test_config();
    config.queue_size = 4;
    let mut ctx = TestContext::with_config(config, ScriptedMemory::new(10));

    let outcomes: Vec<_> = (0..5)
        .map(|id| ctx.issue(Request::read(id, 0x1000 + id * 64, 8)))
        .collect();

    let rejected: Vec<_> = outcomes
        .iter()
        .filter(|o| matches!(o, IssueOutcome::Rejected(_)))
        .collect();
    assert_eq!(rejected.len(), 1);
    assert!(matches!(&outcomes[4], IssueOutcome::Rejected(r) if r.id == 4));
    assert_eq!(ctx.queued_ids(), vec![0, 1, 2, 3]);
    assert!(!ctx.ctrl().is_issuable(&Request::read(9, 0, 8)));
}

#[test]
fn rejected_request_is_returned_untouched() {
    let mut config = test_config();
    config.queue_size = 1;
    let mut ctrl = CachedController::new(config, ScriptedMemory::new(10));
    let mut events = clock_at(50);

    ctrl.issue(Request::read(0, 0, 8), &mut events).unwrap();
    let second = Request::read(1, 0x40, 8);
    let outcome = ctrl.issue(second.clone(), &mut events).unwrap();
    assert_eq!(outcome, IssueOutcome::Rejected(second));
    assert_eq!(ctrl.stats().mem_reads, 1);
    assert_eq!(ctrl.stats().cache_tries, 1);
}

#[test]
fn full_queue_rejects_even_cache_hits() {
    // Capacity is checked before the cache is consulted.
    let mut config = test_config();
    config.queue_size = 1;
    let mut ctx = TestContext::with_config(config, ScriptedMemory::new(10));
    ctx.prefill(0x80, &[1; 8]);
    ctx.issue(Request::read(0, 0x1000, 8));
    assert!(!ctx.issue(Request::read(1, 0x80, 8)).is_accepted());
}

// ══════════════════════════════════════════════════════════
// 2. Read fast path
// ══════════════════════════════════════════════════════════

#[test]
fn cached_read_schedules_response_after_cache_latency() {
    let mut ctrl = controller();
    ctrl.cache_mut().write_data(0x200, &[1, 2, 3, 4], 4).unwrap();

    let mut events = clock_at(100);
    events
        .expect_insert_event()
        .withf(|kind, request, at| {
            *kind == EventKind::Response
                && *at == 102
                && request.id == 7
                && request.arrival_cycle == 100
                && request.issue_cycle == 100
                && request.status == RequestStatus::Issued
                && request.payload.as_deref() == Some(&[1, 2, 3, 4][..])
        })
        .times(1)
        .return_const(());

    let outcome = ctrl.issue(Request::read(7, 0x200, 4), &mut events).unwrap();
    assert_eq!(outcome, IssueOutcome::ServicedFromCache);
    assert!(ctrl.queue().is_empty());
    assert_eq!(ctrl.stats().mem_reads, 1);
    assert_eq!(ctrl.stats().cache_tries, 1);
    assert_eq!(ctrl.stats().cache_hits, 1);
}

#[test]
fn read_miss_is_queued_with_arrival_stamp() {
    let mut ctrl = controller();
    let mut events = clock_at(42);
    events.expect_insert_event().never();

    let outcome = ctrl.issue(Request::read(3, 0x200, 4), &mut events).unwrap();
    assert_eq!(outcome, IssueOutcome::Enqueued);
    let queued = &ctrl.queue().front().unwrap().request;
    assert_eq!(queued.arrival_cycle, 42);
    assert_eq!(queued.status, RequestStatus::Pending);
    assert_eq!(ctrl.stats().mem_reads, 1);
    assert_eq!(ctrl.stats().cache_tries, 1);
    assert_eq!(ctrl.stats().cache_hits, 0);
}

#[test]
fn partially_cached_read_misses() {
    let mut ctrl = controller();
    ctrl.cache_mut().write_data(0x200, &[1, 2], 2).unwrap();
    let mut events = clock_at(0);
    events.expect_insert_event().never();

    let outcome = ctrl.issue(Request::read(0, 0x200, 4), &mut events).unwrap();
    assert_eq!(outcome, IssueOutcome::Enqueued);
}

#[test]
fn read_precharge_uses_fast_path_too() {
    let mut ctrl = controller();
    ctrl.cache_mut().write_data(0x200, &[9; 8], 8).unwrap();
    let mut events = clock_at(5);
    events.expect_insert_event().times(1).return_const(());

    let request = Request::read(0, 0x200, 8).with_kind(RequestKind::ReadPrecharge);
    let outcome = ctrl.issue(request, &mut events).unwrap();
    assert_eq!(outcome, IssueOutcome::ServicedFromCache);
}

// ══════════════════════════════════════════════════════════
// 3. Writes
// ══════════════════════════════════════════════════════════

#[test]
fn write_is_mirrored_into_cache() {
    let mut ctx = TestContext::new(ScriptedMemory::new(10));
    let outcome = ctx.issue(Request::write(0, 0x300, vec![0xAB; 16]));
    assert_eq!(outcome, IssueOutcome::Enqueued);
    assert!(ctx.ctrl().cache().has_data(0x300, 16));
    assert_eq!(ctx.ctrl().stats().cache_writes, 1);
    assert_eq!(ctx.ctrl().stats().mem_writes, 1);

    // The following read of the same bytes is a cache hit.
    let outcome = ctx.issue(Request::read(1, 0x304, 4));
    assert_eq!(outcome, IssueOutcome::ServicedFromCache);
}

#[test]
fn write_without_payload_skips_cache() {
    let mut ctx = TestContext::new(ScriptedMemory::new(10));
    let outcome = ctx.issue(Request::new(0, RequestKind::Write, 0x300, 8));
    assert_eq!(outcome, IssueOutcome::Enqueued);
    assert_eq!(ctx.ctrl().cache().current_size(), 0);
    assert_eq!(ctx.ctrl().stats().cache_writes, 0);
    assert_eq!(ctx.ctrl().stats().mem_writes, 1);
}

#[test]
fn short_payload_is_a_controller_error() {
    let mut ctrl = controller();
    let mut events = clock_at(0);
    let mut request = Request::write(5, 0x400, vec![1, 2]);
    request.size = 8;

    let err = ctrl.issue(request, &mut events).unwrap_err();
    assert_eq!(
        err,
        ControllerError::Cache {
            id: 5,
            source: CacheError::PayloadTooShort {
                address: 0x400,
                size: 8,
                available: 2
            }
        }
    );
    assert!(ctrl.queue().is_empty());
    assert_eq!(ctrl.cache().current_size(), 0);
    assert_eq!(ctrl.stats().mem_writes, 0);
    assert_eq!(ctrl.stats().cache_writes, 0);
}
