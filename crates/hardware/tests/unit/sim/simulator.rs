//! Simulator Tests.
//!
//! Verifies ticking, draining, and trace replay, including queue-full retries, cycle limits,
//! and an end-to-end run against the reference banked memory.

use memsched_core::common::ControllerError;
use memsched_core::config::Config;
use memsched_core::controller::request::Request;
use memsched_core::controller::{CachedController, IssueOutcome};
use memsched_core::sim::simulator::{RunSummary, Simulator};
use memsched_core::sim::trace::{TraceReader, TraceRecord};
use pretty_assertions::assert_eq;

use crate::common::harness::test_config;
use crate::common::mocks::memory::ScriptedMemory;

fn scripted(queue_size: usize, latency: u64) -> Simulator<ScriptedMemory> {
    let mut config = test_config();
    config.queue_size = queue_size;
    Simulator::new(CachedController::new(config, ScriptedMemory::new(latency)))
}

fn at(cycle: u64, request: Request) -> TraceRecord {
    TraceRecord { cycle, request }
}

// ══════════════════════════════════════════════════════════
// 1. Ticking and draining
// ══════════════════════════════════════════════════════════

#[test]
fn new_simulator_is_idle_at_cycle_zero() {
    let sim = scripted(4, 1);
    assert_eq!(sim.cycle(), 0);
    assert!(sim.is_idle());
    assert!(sim.events().is_empty());
}

#[test]
fn tick_advances_clock() {
    let mut sim = scripted(4, 1);
    assert!(sim.tick().is_empty());
    assert!(sim.tick().is_empty());
    assert_eq!(sim.cycle(), 2);
}

#[test]
fn drain_stops_at_limit() {
    let mut sim = scripted(4, 50);
    sim.issue(Request::read(0, 0x40, 8)).unwrap();

    assert!(sim.drain(Some(10)).is_empty());
    assert_eq!(sim.cycle(), 10);
    assert!(!sim.is_idle());

    let done = sim.drain(None);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].completion_cycle, 50);
    assert!(sim.is_idle());
}

// ══════════════════════════════════════════════════════════
// 2. Replay
// ══════════════════════════════════════════════════════════

#[test]
fn replay_retries_rejected_requests() {
    let mut sim = scripted(1, 2);
    let records = (0..3).map(|id| at(0, Request::read(id, 0x1000 * (id + 1), 8)));

    let summary = sim.replay(records, None).unwrap();
    assert_eq!(summary.accepted, 3);
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.rejections, 2);
    assert!(!summary.truncated);

    // One dispatch per cycle, each request presented again the cycle after its rejection.
    let issued: Vec<_> = sim
        .controller
        .memory()
        .issued
        .iter()
        .map(|(r, cycle)| (r.id, r.arrival_cycle, *cycle))
        .collect();
    assert_eq!(issued, vec![(0, 0, 0), (1, 1, 1), (2, 2, 2)]);
}

#[test]
fn replay_presents_requests_at_their_cycle() {
    let mut sim = scripted(4, 2);
    let summary = sim
        .replay(vec![at(5, Request::read(0, 0x40, 8))], None)
        .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            cycles: 8,
            accepted: 1,
            completed: 1,
            rejections: 0,
            truncated: false,
        }
    );
    assert_eq!(sim.controller.memory().issued[0].0.arrival_cycle, 5);
    assert_eq!(sim.controller.stats().average_queue_latency(), 0.0);
}

#[test]
fn replay_counts_cache_hits_as_accepted() {
    let mut sim = scripted(4, 2);
    let records = vec![
        at(0, Request::write(0, 0x80, vec![1; 8])),
        at(1, Request::read(1, 0x80, 8)),
    ];
    let summary = sim.replay(records, None).unwrap();
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.completed, 2);
    assert_eq!(sim.controller.stats().cache_hits, 1);
}

#[test]
fn replay_stops_at_cycle_limit() {
    let mut sim = scripted(4, 10);
    let records = vec![
        at(0, Request::read(0, 0x40, 8)),
        at(20, Request::read(1, 0x80, 8)),
    ];
    let summary = sim.replay(records, Some(3)).unwrap();
    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.completed, 0);
    assert!(summary.truncated);
}

#[test]
fn replay_propagates_controller_errors() {
    let mut sim = scripted(4, 1);
    let mut bad = Request::write(7, 0x40, vec![1, 2]);
    bad.size = 8;

    let err = sim.replay(vec![at(0, bad)], None).unwrap_err();
    assert!(matches!(err, ControllerError::Cache { id: 7, .. }));
}

// ══════════════════════════════════════════════════════════
// 3. End to end
// ══════════════════════════════════════════════════════════

#[test]
fn banked_memory_round_trip() {
    let mut sim = Simulator::from_config(&Config::default());
    let data: Vec<u8> = (1..=8).collect();

    let outcome = sim.issue(Request::write(0, 0x1000, data.clone())).unwrap();
    assert_eq!(outcome, IssueOutcome::Enqueued);
    let outcome = sim.issue(Request::read(1, 0x1000, 8)).unwrap();
    assert_eq!(outcome, IssueOutcome::ServicedFromCache);

    let done = sim.drain(Some(1_000));
    assert_eq!(done.len(), 2);
    let read = done.iter().find(|r| r.id == 1).unwrap();
    assert_eq!(read.payload.as_deref(), Some(&data[..]));
    assert_eq!(sim.controller.memory().peek(0x1000, 8), data);
}

#[test]
fn trace_replay_against_banked_memory() {
    let trace = "\
0 W 0x0000 0102030405060708
0 W 0x4000 1111111111111111
1 R 0x4000
2 RP 0x8000 00000000
3 R 0x0000 0000000000000000
";
    let config = Config::default();
    let records = TraceReader::new(trace.as_bytes(), config.controller.cache_line_bytes)
        .read_all()
        .unwrap();

    let mut sim = Simulator::from_config(&config);
    let summary = sim.replay(records, Some(10_000)).unwrap();
    assert_eq!(summary.accepted, 5);
    assert_eq!(summary.completed, 5);
    assert!(!summary.truncated);

    let stats = sim.controller.stats();
    assert_eq!(stats.mem_writes, 2);
    assert_eq!(stats.mem_reads, 3);
    assert_eq!(stats.cache_writes, 2);
    assert_eq!(stats.measured_latencies(), 5);
    assert_eq!(sim.controller.memory().peek(0x4000, 2), vec![0x11, 0x11]);
}
