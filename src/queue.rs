// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Per-channel receive queue.
//
// Each queue owns one FIFO region plus the ordered list of message records
// written into it. The interrupt-side producer and the consumer both go
// through the queue's own spin lock; no lock is shared between channels.
//
// Layout of pending data inside the region:
//
//   oldest record offset ─┐                ┌─ write offset
//                         ▼                ▼
//   [ .... free .... | msg0 | msg1 | msg2 | .... free .... ]
//
// The pending bytes always form one (possibly wrapped) run ending at the
// write offset, so as long as `unread + n <= capacity` a new copy can never
// overwrite a message that has not been consumed.

use std::collections::VecDeque;

use log::trace;

use crate::error::{Error, Result};
use crate::fifo::FifoRegion;
use crate::spin_lock::{SpinGuard, SpinLock};

/// Bookkeeping for one message sitting in the FIFO region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgRecord {
    /// Offset in the region at which the message starts.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    /// Arrival number, starting at 0 after creation or reset.
    pub seq: u32,
}

/// Queue contents. Only reachable through [`RxQueue::lock`].
pub struct QueueState {
    name: &'static str,
    fifo: FifoRegion,
    records: VecDeque<MsgRecord>,
    max_pending: usize,
    unread: usize,
    next_seq: u32,
}

impl QueueState {
    /// Copy `payload` into the region and append its record.
    ///
    /// Never allocates: the record list is reserved up front and a full list
    /// is reported as [`Error::QueueFull`].
    pub fn enqueue(&mut self, payload: &[u8]) -> Result<()> {
        let n = payload.len();
        let capacity = self.fifo.capacity();
        if n > capacity {
            return Err(Error::Oversize { len: n, capacity });
        }
        if self.unread + n > capacity || self.records.len() >= self.max_pending {
            return Err(Error::QueueFull {
                channel: self.name,
                requested: n,
                pending: self.unread,
                capacity,
            });
        }

        let offset = self.fifo.write(payload)?;
        self.records.push_back(MsgRecord {
            offset,
            len: n,
            seq: self.next_seq,
        });
        self.next_seq = self.next_seq.wrapping_add(1);
        self.unread += n;
        trace!(
            "{}: queued {n} bytes at {offset}, {} pending",
            self.name,
            self.unread
        );
        Ok(())
    }

    /// Pop the oldest message into `out` and return its length.
    ///
    /// On [`Error::BufferTooSmall`] the message stays queued.
    pub fn dequeue(&mut self, out: &mut [u8]) -> Result<usize> {
        let rec = *self.records.front().ok_or(Error::Empty)?;
        if out.len() < rec.len {
            return Err(Error::BufferTooSmall {
                needed: rec.len,
                available: out.len(),
            });
        }
        self.fifo.read_at(rec.offset, &mut out[..rec.len])?;
        self.records.pop_front();
        self.unread -= rec.len;
        Ok(rec.len)
    }

    /// Unread bytes across all pending messages.
    pub fn peek_pending_size(&self) -> usize {
        self.unread
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Length of the oldest pending message.
    pub fn front_len(&self) -> Option<usize> {
        self.records.front().map(|r| r.len)
    }

    pub fn pending_count(&self) -> usize {
        self.records.len()
    }

    /// Pending records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &MsgRecord> {
        self.records.iter()
    }

    /// Drop every pending record and rewind the region.
    pub fn reset(&mut self) {
        self.records.clear();
        self.unread = 0;
        self.next_seq = 0;
        self.fifo.reset();
    }

    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }

    pub fn write_offset(&self) -> usize {
        self.fifo.write_offset()
    }

    pub fn fifo(&self) -> &FifoRegion {
        &self.fifo
    }
}

/// A channel's receive queue behind its own lock.
pub struct RxQueue {
    name: &'static str,
    state: SpinLock<QueueState>,
}

impl RxQueue {
    /// Create a queue over `fifo` that holds at most `max_pending` messages.
    pub fn new(name: &'static str, fifo: FifoRegion, max_pending: usize) -> Self {
        Self {
            name,
            state: SpinLock::new(QueueState {
                name,
                fifo,
                records: VecDeque::with_capacity(max_pending),
                max_pending,
                unread: 0,
                next_seq: 0,
            }),
        }
    }

    /// Take the queue lock. Keep the guard only for bounded work.
    pub fn lock(&self) -> SpinGuard<'_, QueueState> {
        self.state.lock()
    }

    pub fn enqueue(&self, payload: &[u8]) -> Result<()> {
        self.lock().enqueue(payload)
    }

    pub fn dequeue(&self, out: &mut [u8]) -> Result<usize> {
        self.lock().dequeue(out)
    }

    pub fn peek_pending_size(&self) -> usize {
        self.lock().peek_pending_size()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn front_len(&self) -> Option<usize> {
        self.lock().front_len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending_count()
    }

    pub fn reset(&self) {
        self.lock().reset()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(cap: usize, max_pending: usize) -> RxQueue {
        RxQueue::new("test", FifoRegion::with_capacity(cap), max_pending)
    }

    #[test]
    fn records_carry_offsets_and_sequence() {
        let q = queue(16, 8);
        q.enqueue(&[1; 10]).unwrap();
        q.enqueue(&[2; 4]).unwrap();
        let g = q.lock();
        let recs: Vec<_> = g.records().copied().collect();
        assert_eq!(
            recs,
            vec![
                MsgRecord {
                    offset: 0,
                    len: 10,
                    seq: 0
                },
                MsgRecord {
                    offset: 10,
                    len: 4,
                    seq: 1
                },
            ]
        );
    }

    #[test]
    fn record_limit_is_queue_full() {
        let q = queue(64, 2);
        q.enqueue(&[1]).unwrap();
        q.enqueue(&[2]).unwrap();
        assert!(matches!(q.enqueue(&[3]), Err(Error::QueueFull { .. })));
        assert_eq!(q.pending_count(), 2);
    }

    #[test]
    fn name_does_not_take_the_lock() {
        let q = RxQueue::new("RPC", FifoRegion::with_capacity(8), 2);
        let _g = q.lock();
        assert_eq!(q.name(), "RPC");
    }

    #[test]
    fn short_buffer_keeps_message() {
        let q = queue(16, 4);
        q.enqueue(&[7; 6]).unwrap();
        let mut out = [0u8; 4];
        assert!(matches!(
            q.dequeue(&mut out),
            Err(Error::BufferTooSmall {
                needed: 6,
                available: 4
            })
        ));
        assert_eq!(q.front_len(), Some(6));
        assert_eq!(q.peek_pending_size(), 6);
    }
}
