//! Error definitions.
//!
//! This module defines the error types surfaced by the simulator. It provides:
//! 1. **Cache Errors:** Caller-contract violations on cache writes.
//! 2. **Controller Errors:** Failures that reject a request outright (not backpressure).
//! 3. **Configuration Errors:** Invalid or unparsable configuration values.
//! 4. **Trace Errors:** Malformed request trace input.
//!
//! A full request queue is *not* an error; see
//! [`IssueOutcome::Rejected`](crate::controller::IssueOutcome::Rejected).

use thiserror::Error;

/// Errors raised by the cache engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The write payload holds fewer bytes than the declared write size.
    #[error("write of {size} bytes at {address:#x} carries only {available} payload bytes")]
    PayloadTooShort {
        /// Target address of the write.
        address: u64,
        /// Declared write size in bytes.
        size: usize,
        /// Bytes actually present in the payload.
        available: usize,
    },
}

/// Errors raised by the memory controller when a request cannot be accepted at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// A write request arrived without a payload covering its size.
    #[error("request {id}: {source}")]
    Cache {
        /// Identifier of the offending request.
        id: u64,
        /// Underlying cache error.
        #[source]
        source: CacheError,
    },
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A key/value entry could not be parsed as the expected type.
    #[error("invalid value {value:?} for configuration key {key}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Raw value found in the source.
        value: String,
    },

    /// A line of a key/value configuration file is not `Key Value`.
    #[error("line {line}: expected `Key Value`, found {text:?}")]
    Malformed {
        /// One-based line number.
        line: usize,
        /// Offending text.
        text: String,
    },

    /// A value parsed but lies outside the supported range.
    #[error("configuration key {key} out of range: {reason}")]
    OutOfRange {
        /// Configuration key.
        key: &'static str,
        /// Human-readable constraint.
        reason: String,
    },

    /// JSON configuration could not be deserialised.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a request trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A trace line does not have the expected fields.
    #[error("trace line {line}: {reason}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The trace file could not be read.
    #[error("cannot read trace: {0}")]
    Io(#[from] std::io::Error),
}
