//! Backing memory models.
//!
//! The cached controller decides *which* request advances each cycle; the backing memory
//! decides *how long* it takes. This module provides:
//! 1. **BackingMemory:** The trait the controller schedules against (row/bank state queries,
//!    command issue, per-cycle completion).
//! 2. **BankedMemory:** A small reference model with an open row per bank and fixed
//!    CAS/RAS/precharge latencies, used by the simulator driver and the tests.

/// Reference bank/row timing model.
pub mod banked;

pub use banked::BankedMemory;

use crate::controller::request::Request;

/// Trait for the memory model behind the controller.
///
/// Implementors own bank and row timing entirely. The controller only asks about the state
/// relevant to its scheduling rules and hands over requests it has selected.
pub trait BackingMemory: Send + std::fmt::Debug {
    /// Returns true if `request` targets the row currently open in its bank.
    fn is_row_hit(&self, request: &Request) -> bool;

    /// Returns true if `request`'s bank has any row open.
    fn is_bank_open(&self, request: &Request) -> bool;

    /// Returns true if `request`'s bank can take a new command at `cycle`.
    fn can_accept(&self, request: &Request, cycle: u64) -> bool;

    /// Takes ownership of `request` and starts servicing it at `cycle`.
    fn issue_memory_commands(&mut self, request: Request, cycle: u64);

    /// Advances the model to `cycle`.
    ///
    /// # Returns
    ///
    /// Requests whose service finished at or before `cycle`, in completion order. Writes may
    /// come back flagged `cancelled` or `paused`, asking the controller to retry them.
    fn cycle(&mut self, cycle: u64) -> Vec<Request>;

    /// Number of requests currently being serviced.
    fn in_flight(&self) -> usize;
}
