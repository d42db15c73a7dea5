//! Cached FR-FCFS memory controller library.
//!
//! This crate models the front end of a memory controller that schedules requests with a
//! first-ready, first-come-first-served policy and keeps a byte-addressable data cache in front
//! of the backing memory. It provides:
//! 1. **Cache:** Fully associative byte-granular cache with LRU or random eviction.
//! 2. **Controller:** Bounded admission queue, six-rule request selection, completion handling.
//! 3. **Backend:** The backing-memory seam and a bank/row reference timing model.
//! 4. **Simulation:** Event queue, cycle driver, trace replay, configuration, and statistics.
//!
//! # Example
//!
//! ```
//! use memsched_core::config::Config;
//! use memsched_core::controller::request::Request;
//! use memsched_core::sim::simulator::Simulator;
//!
//! let mut sim = Simulator::from_config(&Config::default());
//! sim.issue(Request::write(0, 0x1000, vec![1, 2, 3, 4])).unwrap();
//! let done = sim.drain(Some(1_000));
//! assert_eq!(done.len(), 1);
//! assert!(sim.controller.cache().has_data(0x1000, 4));
//! ```

/// Backing memory trait and the reference banked model.
pub mod backend;
/// Byte-addressable front-end cache and eviction policies.
pub mod cache;
/// Common types (addresses, address decoding, errors).
pub mod common;
/// Controller and backing memory configuration (defaults, JSON, key/value sources).
pub mod config;
/// Request types, transaction queue, scheduler, and the cached controller.
pub mod controller;
/// Event queue, simulator driver, and trace reader.
pub mod sim;
/// Controller statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The cached memory controller; construct with `CachedController::new`.
pub use crate::controller::CachedController;
/// A memory request.
pub use crate::controller::request::Request;
/// Cycle driver owning a controller and its event queue.
pub use crate::sim::simulator::Simulator;
