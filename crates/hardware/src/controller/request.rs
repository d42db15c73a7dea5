//! Memory requests as they flow through the controller.
//!
//! A [`Request`] is created by the issuer and moved, never copied, from the issuer into the
//! controller, through the transaction queue and the backing memory, and back out to the
//! issuer once complete. The controller only reads and annotates its fields.

use std::fmt;

use crate::common::{PhysAddr, ranges_overlap};

/// Identifier assigned by the issuer.
pub type RequestId = u64;

/// Kind of memory operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Read, leaving the row open afterwards.
    Read,
    /// Read followed by an implicit precharge of the row.
    ReadPrecharge,
    /// Write, leaving the row open afterwards.
    Write,
    /// Write followed by an implicit precharge of the row.
    WritePrecharge,
}

impl RequestKind {
    /// Returns true for `Read` and `ReadPrecharge`.
    #[inline]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadPrecharge)
    }

    /// Returns true for `Write` and `WritePrecharge`.
    #[inline]
    pub const fn is_write(self) -> bool {
        !self.is_read()
    }

    /// Returns true for the variants that close the row after the access.
    #[inline]
    pub const fn closes_row(self) -> bool {
        matches!(self, Self::ReadPrecharge | Self::WritePrecharge)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "READ",
            Self::ReadPrecharge => "READ_PRECHARGE",
            Self::Write => "WRITE",
            Self::WritePrecharge => "WRITE_PRECHARGE",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestStatus {
    /// Waiting in the controller.
    #[default]
    Pending,
    /// Handed to the backing memory or serviced from the cache.
    Issued,
    /// Finished.
    Complete,
}

/// A memory request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// Issuer-assigned identifier.
    pub id: RequestId,
    /// Operation kind.
    pub kind: RequestKind,
    /// First byte accessed.
    pub address: PhysAddr,
    /// Number of bytes accessed.
    pub size: usize,
    /// Data written, or data returned by a read. `None` means the payload is not valid.
    pub payload: Option<Vec<u8>>,
    /// Cycle the controller accepted the request.
    pub arrival_cycle: u64,
    /// Cycle the request left the queue.
    pub issue_cycle: u64,
    /// Cycle the request completed.
    pub completion_cycle: u64,
    /// Lifecycle state.
    pub status: RequestStatus,
    /// Set by the backing memory when it abandoned the request.
    pub cancelled: bool,
    /// Set by the backing memory when it suspended a write in favour of a read.
    pub paused: bool,
}

impl Request {
    /// Creates a request with no payload and zeroed timestamps.
    pub const fn new(id: RequestId, kind: RequestKind, address: u64, size: usize) -> Self {
        Self {
            id,
            kind,
            address: PhysAddr::new(address),
            size,
            payload: None,
            arrival_cycle: 0,
            issue_cycle: 0,
            completion_cycle: 0,
            status: RequestStatus::Pending,
            cancelled: false,
            paused: false,
        }
    }

    /// Creates a read of `size` bytes.
    pub const fn read(id: RequestId, address: u64, size: usize) -> Self {
        Self::new(id, RequestKind::Read, address, size)
    }

    /// Creates a write whose size is the payload length.
    pub fn write(id: RequestId, address: u64, data: Vec<u8>) -> Self {
        let mut request = Self::new(id, RequestKind::Write, address, data.len());
        request.payload = Some(data);
        request
    }

    /// Replaces the operation kind.
    #[must_use]
    pub fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns true if the request reads.
    #[inline]
    pub const fn is_read(&self) -> bool {
        self.kind.is_read()
    }

    /// Returns true if the request writes.
    #[inline]
    pub const fn is_write(&self) -> bool {
        self.kind.is_write()
    }

    /// Returns true if the payload is present.
    #[inline]
    pub const fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Raw start address.
    #[inline]
    pub const fn addr(&self) -> u64 {
        self.address.val()
    }

    /// Returns true if this request's byte range overlaps `other`'s.
    pub const fn overlaps(&self, other: &Self) -> bool {
        ranges_overlap(self.addr(), self.size, other.addr(), other.size)
    }

    /// Returns true if the backing memory asked for this request to be retried.
    #[inline]
    pub const fn needs_retry(&self) -> bool {
        self.is_write() && (self.cancelled || self.paused)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} [{} B]",
            self.id, self.kind, self.address, self.size
        )
    }
}
