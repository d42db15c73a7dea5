//! Common utilities and types used throughout the memory controller model.
//!
//! This module provides the building blocks shared by the cache, the scheduler, and the
//! simulation driver. It includes:
//! 1. **Address Types:** Physical addresses and the line tag/offset decoder.
//! 2. **Error Handling:** Cache, controller, configuration, and trace error types.

/// Address types and cache-line decoding.
pub mod addr;

/// Error types.
pub mod error;

pub use addr::{AddressDecoder, LineAddr, PhysAddr, Segment, ranges_overlap};
pub use error::{CacheError, ConfigError, ControllerError, TraceError};

/// Cache line size in bytes used when nothing else is configured.
pub const DEFAULT_LINE_BYTES: usize = 64;
