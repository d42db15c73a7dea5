//! Reference bank/row timing model.
//!
//! Each bank keeps at most one open row and is busy for the duration of one access at a
//! time. Latency follows the usual row-buffer rules:
//! 1. **Row hit:** `t_cas`.
//! 2. **Closed bank:** `t_ras + t_cas` (activate, then column access).
//! 3. **Row conflict:** `t_pre + t_ras + t_cas` (precharge the open row first).
//!
//! The precharge request variants close the row after the access, keeping the bank busy for
//! an extra `t_pre`. Data lives in a sparse byte store so reads return what was last written.

use std::collections::HashMap;

use tracing::trace;

use super::BackingMemory;
use crate::config::MemoryConfig;
use crate::controller::request::Request;

/// State of one bank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Bank {
    open_row: Option<u64>,
    busy_until: u64,
}

/// A request being serviced.
#[derive(Clone, Debug)]
struct InFlight {
    done_at: u64,
    request: Request,
}

/// Bank-interleaved memory with one open row per bank.
#[derive(Debug)]
pub struct BankedMemory {
    banks: Vec<Bank>,
    row_shift: u32,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
    in_flight: Vec<InFlight>,
    store: HashMap<u64, u8>,
}

impl BankedMemory {
    /// Creates a memory with the given geometry and timing parameters (in cycles).
    ///
    /// # Arguments
    ///
    /// * `banks` - Number of banks (at least one is always modelled).
    /// * `row_bytes` - Row size; rounded up to a power of two.
    /// * `t_cas` - Column access strobe latency.
    /// * `t_ras` - Row access strobe latency.
    /// * `t_pre` - Precharge latency.
    pub fn new(banks: usize, row_bytes: u64, t_cas: u64, t_ras: u64, t_pre: u64) -> Self {
        Self {
            banks: vec![Bank::default(); banks.max(1)],
            row_shift: row_bytes.max(1).next_power_of_two().trailing_zeros(),
            t_cas,
            t_ras,
            t_pre,
            in_flight: Vec::new(),
            store: HashMap::new(),
        }
    }

    /// Creates a memory from a validated configuration.
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(
            config.banks,
            config.row_bytes,
            config.t_cas,
            config.t_ras,
            config.t_pre,
        )
    }

    /// Maps an address to its `(bank, row)`.
    ///
    /// Consecutive rows are interleaved across banks.
    pub fn locate(&self, address: u64) -> (usize, u64) {
        let row_index = address >> self.row_shift;
        let banks = self.banks.len() as u64;
        ((row_index % banks) as usize, row_index / banks)
    }

    /// Row currently open in `bank`.
    pub fn open_row(&self, bank: usize) -> Option<u64> {
        self.banks.get(bank).and_then(|b| b.open_row)
    }

    /// Preloads memory contents at `address`.
    pub fn load(&mut self, address: u64, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let _ = self.store.insert(address.wrapping_add(i as u64), byte);
        }
    }

    /// Reads memory contents directly, bypassing timing; unwritten bytes are zero.
    pub fn peek(&self, address: u64, size: usize) -> Vec<u8> {
        (0..size as u64)
            .map(|i| {
                self.store
                    .get(&address.wrapping_add(i))
                    .copied()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Cycles to access `row` given the bank's current state.
    fn access_latency(&self, bank: &Bank, row: u64) -> u64 {
        match bank.open_row {
            Some(open_row) if open_row == row => self.t_cas,
            Some(_) => self.t_pre + self.t_ras + self.t_cas,
            None => self.t_ras + self.t_cas,
        }
    }

    fn finish(&mut self, mut request: Request) -> Request {
        if request.is_write() {
            if let Some(data) = request.payload.as_deref() {
                let address = request.addr();
                let len = request.size.min(data.len());
                self.load(address, &data[..len]);
            }
        } else {
            request.payload = Some(self.peek(request.addr(), request.size));
        }
        request
    }
}

impl BackingMemory for BankedMemory {
    fn is_row_hit(&self, request: &Request) -> bool {
        let (bank, row) = self.locate(request.addr());
        self.banks[bank].open_row == Some(row)
    }

    fn is_bank_open(&self, request: &Request) -> bool {
        let (bank, _) = self.locate(request.addr());
        self.banks[bank].open_row.is_some()
    }

    fn can_accept(&self, request: &Request, cycle: u64) -> bool {
        let (bank, _) = self.locate(request.addr());
        self.banks[bank].busy_until <= cycle
    }

    fn issue_memory_commands(&mut self, request: Request, cycle: u64) {
        let (index, row) = self.locate(request.addr());
        let bank = self.banks[index];
        let latency = self.access_latency(&bank, row);
        let done_at = cycle + latency;
        let closes_row = request.kind.closes_row();

        self.banks[index] = Bank {
            open_row: if closes_row { None } else { Some(row) },
            busy_until: if closes_row { done_at + self.t_pre } else { done_at },
        };
        trace!(
            "bank {index} row {row:#x}: {request} done at {done_at} ({latency} cycles)"
        );

        let at = self.in_flight.partition_point(|f| f.done_at <= done_at);
        self.in_flight.insert(at, InFlight { done_at, request });
    }

    fn cycle(&mut self, cycle: u64) -> Vec<Request> {
        let ready = self.in_flight.partition_point(|f| f.done_at <= cycle);
        let finished: Vec<InFlight> = self.in_flight.drain(..ready).collect();
        finished
            .into_iter()
            .map(|f| self.finish(f.request))
            .collect()
    }

    fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
