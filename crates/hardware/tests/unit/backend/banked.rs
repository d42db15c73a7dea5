//! Banked Memory Tests.
//!
//! Verifies the reference memory's address interleaving, row-buffer latencies, precharge
//! behaviour, bank busy windows, and that reads return previously written data.

use memsched_core::backend::{BackingMemory, BankedMemory};
use memsched_core::config::MemoryConfig;
use memsched_core::controller::request::{Request, RequestKind};
use pretty_assertions::assert_eq;
use rstest::rstest;

const T_CAS: u64 = 2;
const T_RAS: u64 = 3;
const T_PRE: u64 = 4;

/// Two banks of 1 KiB rows.
fn memory() -> BankedMemory {
    BankedMemory::new(2, 1024, T_CAS, T_RAS, T_PRE)
}

/// Issues `request` at `cycle` and returns the cycle it finishes.
fn finish_cycle(mem: &mut BankedMemory, request: Request, cycle: u64) -> u64 {
    let id = request.id;
    mem.issue_memory_commands(request, cycle);
    (cycle..cycle + 100)
        .find(|&c| mem.cycle(c).iter().any(|r| r.id == id))
        .unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Address mapping
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(0x000, (0, 0))]
#[case(0x3FF, (0, 0))]
#[case(0x400, (1, 0))]
#[case(0x800, (0, 1))]
#[case(0xC10, (1, 1))]
fn rows_interleave_across_banks(#[case] address: u64, #[case] expected: (usize, u64)) {
    assert_eq!(memory().locate(address), expected);
}

#[test]
fn row_size_rounds_up_to_power_of_two() {
    let mem = BankedMemory::new(1, 1000, 1, 1, 1);
    assert_eq!(mem.locate(1023), (0, 0));
    assert_eq!(mem.locate(1024), (0, 1));
}

#[test]
fn from_config_uses_geometry() {
    let mem = BankedMemory::from_config(&MemoryConfig::default());
    assert_eq!(mem.locate(2048), (1, 0));
    assert_eq!(mem.locate(8 * 2048), (0, 1));
}

// ══════════════════════════════════════════════════════════
// 2. Timing
// ══════════════════════════════════════════════════════════

#[test]
fn closed_bank_pays_activate() {
    let mut mem = memory();
    let read = Request::read(0, 0x10, 8);
    assert!(!mem.is_bank_open(&read));
    assert!(!mem.is_row_hit(&read));

    assert_eq!(finish_cycle(&mut mem, read, 0), T_RAS + T_CAS);
    assert_eq!(mem.open_row(0), Some(0));
    assert_eq!(mem.open_row(1), None);
}

#[test]
fn row_hit_pays_column_access_only() {
    let mut mem = memory();
    let t = finish_cycle(&mut mem, Request::read(0, 0x10, 8), 0);

    let hit = Request::read(1, 0x80, 8);
    assert!(mem.is_row_hit(&hit));
    assert_eq!(finish_cycle(&mut mem, hit, t), t + T_CAS);
}

#[test]
fn row_conflict_pays_precharge() {
    let mut mem = memory();
    let t = finish_cycle(&mut mem, Request::read(0, 0x10, 8), 0);

    let conflict = Request::read(1, 0x810, 8);
    assert!(mem.is_bank_open(&conflict));
    assert!(!mem.is_row_hit(&conflict));
    assert_eq!(finish_cycle(&mut mem, conflict, t), t + T_PRE + T_RAS + T_CAS);
    assert_eq!(mem.open_row(0), Some(1));
}

#[test]
fn bank_is_busy_until_access_completes() {
    let mut mem = memory();
    let read = Request::read(0, 0x10, 8);
    mem.issue_memory_commands(read.clone(), 0);
    assert_eq!(mem.in_flight(), 1);

    let done = T_RAS + T_CAS;
    assert!(!mem.can_accept(&read, done - 1));
    assert!(mem.can_accept(&read, done));
    // The other bank is unaffected.
    assert!(mem.can_accept(&Request::read(1, 0x400, 8), 0));
}

#[test]
fn precharge_closes_row_and_extends_busy_window() {
    let mut mem = memory();
    let read = Request::read(0, 0x10, 8).with_kind(RequestKind::ReadPrecharge);
    mem.issue_memory_commands(read.clone(), 0);

    let done = T_RAS + T_CAS;
    assert_eq!(mem.open_row(0), None);
    assert!(!mem.is_bank_open(&read));
    assert!(!mem.can_accept(&read, done + T_PRE - 1));
    assert!(mem.can_accept(&read, done + T_PRE));
    assert_eq!(mem.cycle(done).len(), 1);
}

#[test]
fn completions_come_back_in_finish_order() {
    let mut mem = memory();
    let t = finish_cycle(&mut mem, Request::read(0, 0x10, 8), 0);

    // A closed-bank access issued first finishes after a row hit issued alongside it.
    mem.issue_memory_commands(Request::read(1, 0x410, 8), t);
    mem.issue_memory_commands(Request::read(2, 0x20, 8), t);
    assert_eq!(mem.in_flight(), 2);

    let ids: Vec<_> = mem.cycle(t + 100).iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(mem.in_flight(), 0);
}

// ══════════════════════════════════════════════════════════
// 3. Data
// ══════════════════════════════════════════════════════════

#[test]
fn read_returns_written_data() {
    let mut mem = memory();
    let t = finish_cycle(&mut mem, Request::write(0, 0x20, vec![1, 2, 3, 4]), 0);
    assert_eq!(mem.peek(0x20, 4), vec![1, 2, 3, 4]);

    mem.issue_memory_commands(Request::read(1, 0x1E, 8), t);
    let done = mem.cycle(t + T_CAS);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].payload.as_deref(), Some(&[0, 0, 1, 2, 3, 4, 0, 0][..]));
}

#[test]
fn preloaded_contents_are_readable() {
    let mut mem = memory();
    mem.load(0x500, &[9; 3]);
    assert_eq!(mem.peek(0x4FF, 5), vec![0, 9, 9, 9, 0]);
}
