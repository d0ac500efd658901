// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Circular FIFO view over a fixed-size byte region.
//
// The region is the software side of one shared-memory FIFO: a ring of bytes
// with a single write cursor. Copies that run past the end continue at
// offset 0. No policy lives here; callers decide how much may be written.

use crate::error::{Error, Result};

/// Backing storage for a FIFO region.
///
/// Implemented by plain heap memory and by named shared-memory mappings so
/// the same queue code runs against either.
pub trait FifoMemory: Send {
    fn as_slice(&self) -> &[u8];
    fn as_mut_slice(&mut self) -> &mut [u8];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Zero-filled heap storage.
pub struct HeapMemory {
    buf: Box<[u8]>,
}

impl HeapMemory {
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![0u8; size].into_boxed_slice(),
        }
    }
}

impl FifoMemory for HeapMemory {
    fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl FifoMemory for Vec<u8> {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }
}

/// A circular byte region with a write cursor.
pub struct FifoRegion {
    mem: Box<dyn FifoMemory>,
    write_offset: usize,
}

impl FifoRegion {
    pub fn new(mem: Box<dyn FifoMemory>) -> Self {
        Self {
            mem,
            write_offset: 0,
        }
    }

    /// Region backed by `size` bytes of heap memory.
    pub fn with_capacity(size: usize) -> Self {
        Self::new(Box::new(HeapMemory::new(size)))
    }

    pub fn capacity(&self) -> usize {
        self.mem.len()
    }

    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Raw contents of the whole region, starting at offset 0.
    pub fn as_bytes(&self) -> &[u8] {
        self.mem.as_slice()
    }

    /// Copy `payload` in at the write cursor, wrapping to offset 0 when it
    /// reaches the end of the region. Returns the offset the message starts
    /// at. Nothing is written when `payload` is larger than the region.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize> {
        let cap = self.capacity();
        let n = payload.len();
        if n > cap {
            return Err(Error::Oversize {
                len: n,
                capacity: cap,
            });
        }

        let start = self.write_offset;
        let buf = self.mem.as_mut_slice();
        if start + n < cap {
            buf[start..start + n].copy_from_slice(payload);
            self.write_offset = start + n;
        } else {
            // Fill to the end, then continue at the top of the region.
            let first = cap - start;
            buf[start..].copy_from_slice(&payload[..first]);
            buf[..n - first].copy_from_slice(&payload[first..]);
            self.write_offset = n - first;
        }
        Ok(start)
    }

    /// Copy `out.len()` bytes starting at `offset`, wrapping the same way
    /// [`write`](Self::write) does.
    pub fn read_at(&self, offset: usize, out: &mut [u8]) -> Result<()> {
        let cap = self.capacity();
        let n = out.len();
        if n > cap || (offset >= cap && n > 0) {
            return Err(Error::Oversize {
                len: n,
                capacity: cap,
            });
        }

        let buf = self.mem.as_slice();
        if offset + n <= cap {
            out.copy_from_slice(&buf[offset..offset + n]);
        } else {
            let first = cap - offset;
            out[..first].copy_from_slice(&buf[offset..]);
            out[first..].copy_from_slice(&buf[..n - first]);
        }
        Ok(())
    }

    /// Rewind the write cursor. The bytes themselves are left in place.
    pub fn reset(&mut self) {
        self.write_offset = 0;
    }
}

impl std::fmt::Debug for FifoRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FifoRegion")
            .field("capacity", &self.capacity())
            .field("write_offset", &self.write_offset)
            .finish()
    }
}
