//! Physical addresses and cache-line decoding.
//!
//! This module defines the address types shared by the controller and the cache. It provides:
//! 1. **Type Safety:** A strong type for physical byte addresses carried by requests.
//! 2. **Line Decoding:** Splitting an address into its line tag and in-line offset.
//! 3. **Range Segmentation:** Walking a byte range one cache line at a time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical byte address as seen by the memory controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysAddr(pub u64);

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    ///
    /// # Arguments
    ///
    /// * `addr` - The raw 64-bit address value.
    ///
    /// # Returns
    ///
    /// A new `PhysAddr` instance wrapping the provided address.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for PhysAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

/// A decoded address: the owning line's tag and the byte offset inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineAddr {
    /// Address of the first byte of the line (offset bits cleared).
    pub tag: u64,
    /// Byte offset of the address within its line.
    pub offset: usize,
}

/// One line-sized piece of a byte range produced by [`AddressDecoder::segments`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Tag of the line this piece falls in.
    pub tag: u64,
    /// First byte of the piece within the line.
    pub offset: usize,
    /// Number of bytes in the piece.
    pub len: usize,
    /// Position of the piece within the caller's buffer.
    pub start: usize,
}

/// Maps byte addresses to `(tag, offset)` pairs for a fixed line size.
///
/// `offset = address mod line_bytes` and `tag = address - offset`. The line size does not
/// have to be a power of two, although every configuration shipped with the simulator uses 64.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressDecoder {
    line_bytes: u64,
}

impl AddressDecoder {
    /// Creates a decoder for lines of `line_bytes` bytes.
    ///
    /// A zero line size is bumped to one byte so decoding stays total; configuration
    /// validation rejects zero before it gets here.
    pub const fn new(line_bytes: usize) -> Self {
        let line_bytes = if line_bytes == 0 { 1 } else { line_bytes as u64 };
        Self { line_bytes }
    }

    /// Returns the line size in bytes.
    #[inline]
    pub const fn line_bytes(&self) -> usize {
        self.line_bytes as usize
    }

    /// Splits `address` into its line tag and in-line offset.
    #[inline]
    pub const fn decode(&self, address: u64) -> LineAddr {
        let offset = address % self.line_bytes;
        LineAddr {
            tag: address - offset,
            offset: offset as usize,
        }
    }

    /// Returns the tag of the line holding `address`.
    #[inline]
    pub const fn tag(&self, address: u64) -> u64 {
        self.decode(address).tag
    }

    /// Iterates the per-line pieces covering `[address, address + size)`.
    ///
    /// Pieces are produced in ascending address order. The walk stops at the top of the
    /// address space rather than wrapping around to zero.
    pub const fn segments(&self, address: u64, size: usize) -> Segments {
        Segments {
            decoder: *self,
            next: Some(address),
            remaining: size,
            start: 0,
        }
    }
}

impl Default for AddressDecoder {
    fn default() -> Self {
        Self::new(super::DEFAULT_LINE_BYTES)
    }
}

/// Iterator returned by [`AddressDecoder::segments`].
#[derive(Clone, Debug)]
pub struct Segments {
    decoder: AddressDecoder,
    next: Option<u64>,
    remaining: usize,
    start: usize,
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.remaining == 0 {
            return None;
        }
        let address = self.next?;
        let LineAddr { tag, offset } = self.decoder.decode(address);
        let len = (self.decoder.line_bytes() - offset).min(self.remaining);
        let segment = Segment {
            tag,
            offset,
            len,
            start: self.start,
        };
        self.remaining -= len;
        self.start += len;
        self.next = address.checked_add(len as u64);
        if self.next.is_none() {
            self.remaining = 0;
        }
        Some(segment)
    }
}

/// Returns true if the half-open byte ranges `[a, a + a_len)` and `[b, b + b_len)` overlap.
///
/// Empty ranges never overlap anything.
#[inline]
pub const fn ranges_overlap(a: u64, a_len: usize, b: u64, b_len: usize) -> bool {
    if a_len == 0 || b_len == 0 {
        return false;
    }
    let a_end = a.saturating_add(a_len as u64);
    let b_end = b.saturating_add(b_len as u64);
    a < b_end && b < a_end
}
