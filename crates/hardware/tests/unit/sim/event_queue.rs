//! Event Queue Tests.

use memsched_core::controller::request::Request;
use memsched_core::sim::event::{EventKind, EventQueue, EventScheduler};
use pretty_assertions::assert_eq;

fn schedule(events: &mut EventQueue, id: u64, at: u64) {
    events.insert_event(EventKind::Response, Request::read(id, 0, 8), at);
}

fn drain_due(events: &mut EventQueue) -> Vec<u64> {
    std::iter::from_fn(|| events.pop_due())
        .map(|e| e.request.id)
        .collect()
}

#[test]
fn events_pop_by_cycle_then_insertion_order() {
    let mut events = EventQueue::new();
    schedule(&mut events, 0, 5);
    schedule(&mut events, 1, 3);
    schedule(&mut events, 2, 5);
    schedule(&mut events, 3, 3);
    assert_eq!(events.len(), 4);
    assert_eq!(events.next_cycle(), Some(3));

    events.advance_to(10);
    assert_eq!(drain_due(&mut events), vec![1, 3, 0, 2]);
    assert!(events.is_empty());
}

#[test]
fn nothing_pops_before_it_is_due() {
    let mut events = EventQueue::new();
    schedule(&mut events, 0, 2);

    assert!(events.pop_due().is_none());
    events.advance();
    assert!(events.pop_due().is_none());
    events.advance();
    let event = events.pop_due().unwrap();
    assert_eq!(event.cycle, 2);
    assert_eq!(event.kind, EventKind::Response);
    assert_eq!(events.current_cycle(), 2);
}

#[test]
fn clock_never_runs_backwards() {
    let mut events = EventQueue::starting_at(7);
    assert_eq!(events.current_cycle(), 7);
    events.advance_to(3);
    assert_eq!(events.current_cycle(), 7);
    events.advance_to(9);
    assert_eq!(events.current_cycle(), 9);
}

#[test]
fn overdue_events_are_delivered() {
    let mut events = EventQueue::starting_at(10);
    schedule(&mut events, 4, 1);
    assert_eq!(drain_due(&mut events), vec![4]);
    assert_eq!(events.next_cycle(), None);
}
