//! Byte-granular cache line storage.

/// A fixed-size cache line holding one value byte and one validity bit per slot.
///
/// A slot's value is only meaningful while its validity bit is set; reading an invalid slot
/// yields `None` and the engine substitutes zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheLine {
    data: Box<[u8]>,
    valid: Box<[bool]>,
}

impl CacheLine {
    /// Creates a line of `len` slots, all invalid.
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0; len].into_boxed_slice(),
            valid: vec![false; len].into_boxed_slice(),
        }
    }

    /// Returns the number of slots in the line.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the line has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the byte at `offset` if its slot is valid.
    #[inline]
    pub fn get(&self, offset: usize) -> Option<u8> {
        self.valid
            .get(offset)
            .copied()
            .filter(|&v| v)
            .map(|_| self.data[offset])
    }

    /// Returns true if every slot in `[offset, offset + len)` is valid.
    ///
    /// Slots past the end of the line count as invalid.
    pub fn is_valid(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .and_then(|end| self.valid.get(offset..end))
            .is_some_and(|slots| slots.iter().all(|&v| v))
    }

    /// Number of valid slots in the line.
    pub fn valid_bytes(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Copies `out.len()` bytes starting at `offset` into `out`, writing zero for invalid slots.
    pub fn read_into(&self, offset: usize, out: &mut [u8]) {
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.get(offset + i).unwrap_or(0);
        }
    }

    /// Stores `bytes` starting at `offset` and marks those slots valid.
    ///
    /// Bytes that would fall past the end of the line are ignored.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        let end = (offset + bytes.len()).min(self.data.len());
        if offset >= end {
            return;
        }
        self.data[offset..end].copy_from_slice(&bytes[..end - offset]);
        self.valid[offset..end].fill(true);
    }

    /// Stores `bytes` starting at `offset` into the slots that are not yet valid.
    ///
    /// Valid slots keep their value. Bytes past the end of the line are ignored.
    pub fn fill(&mut self, offset: usize, bytes: &[u8]) {
        let end = (offset + bytes.len()).min(self.data.len());
        for (i, &byte) in (offset..end).zip(bytes) {
            if !self.valid[i] {
                self.data[i] = byte;
                self.valid[i] = true;
            }
        }
    }
}
