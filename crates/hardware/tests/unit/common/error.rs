//! Error Type Tests.
//!
//! Verifies the rendered messages and source chains of the public error enums.

use std::error::Error;

use memsched_core::common::{CacheError, ConfigError, ControllerError, TraceError};

#[test]
fn payload_too_short_message() {
    let err = CacheError::PayloadTooShort {
        address: 0x40,
        size: 8,
        available: 4,
    };
    assert_eq!(
        err.to_string(),
        "write of 8 bytes at 0x40 carries only 4 payload bytes"
    );
}

#[test]
fn controller_error_exposes_cache_source() {
    let source = CacheError::PayloadTooShort {
        address: 0,
        size: 2,
        available: 0,
    };
    let err = ControllerError::Cache {
        id: 7,
        source: source.clone(),
    };
    assert!(err.to_string().starts_with("request 7: "));
    let inner = err.source().unwrap();
    assert_eq!(inner.to_string(), source.to_string());
}

#[test]
fn config_error_names_key() {
    let err = ConfigError::InvalidValue {
        key: "QueueSize".into(),
        value: "lots".into(),
    };
    assert_eq!(
        err.to_string(),
        "invalid value \"lots\" for configuration key QueueSize"
    );
}

#[test]
fn trace_error_names_line() {
    let err = TraceError::Parse {
        line: 3,
        reason: "missing address".into(),
    };
    assert_eq!(err.to_string(), "trace line 3: missing address");
}
