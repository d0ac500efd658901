// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Per-channel descriptor: the channel's receive queue plus the open count
// maintained by the consumer lifecycle.

use std::sync::atomic::{AtomicI32, Ordering};

use log::debug;

use crate::error::{Error, Result};
use crate::queue::RxQueue;
use crate::registry::ChannelInfo;

/// Consumer open count.
///
/// Starts at 1 meaning "not opened". An exclusive open takes it to 0, a
/// release brings it back to 1.
pub struct OpenCount {
    count: AtomicI32,
}

impl OpenCount {
    pub const fn new() -> Self {
        Self {
            count: AtomicI32::new(1),
        }
    }

    /// Claim the channel for a consumer. Fails with [`Error::Busy`] if
    /// another consumer holds it.
    pub fn open(&self) -> Result<()> {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            Ok(())
        } else {
            self.count.fetch_add(1, Ordering::AcqRel);
            Err(Error::Busy)
        }
    }

    pub fn release(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Whether no consumer has the channel open.
    ///
    /// Decrement-and-test, then restore: the counter reads the same before
    /// and after the probe, and the probe is one read-modify-write so a
    /// concurrent `open` either lands before it (probe sees "open") or after
    /// it (probe sees "not opened").
    pub fn probe_unopened(&self) -> bool {
        let unopened = self.count.fetch_sub(1, Ordering::AcqRel) == 1;
        self.count.fetch_add(1, Ordering::AcqRel);
        unopened
    }

    pub fn is_open(&self) -> bool {
        !self.probe_unopened()
    }

    /// Raw counter value, for diagnostics.
    pub fn value(&self) -> i32 {
        self.count.load(Ordering::Acquire)
    }
}

impl Default for OpenCount {
    fn default() -> Self {
        Self::new()
    }
}

/// One logical channel.
pub struct Channel {
    info: &'static ChannelInfo,
    queue: RxQueue,
    open: OpenCount,
}

impl Channel {
    pub fn new(info: &'static ChannelInfo, queue: RxQueue) -> Self {
        Self {
            info,
            queue,
            open: OpenCount::new(),
        }
    }

    pub fn info(&self) -> &'static ChannelInfo {
        self.info
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn queue(&self) -> &RxQueue {
        &self.queue
    }

    pub fn open_count(&self) -> &OpenCount {
        &self.open
    }

    /// Open the channel for its single consumer.
    pub fn open(&self) -> Result<()> {
        self.open.open()?;
        debug!("{}: opened", self.info.name);
        Ok(())
    }

    pub fn release(&self) {
        self.open.release();
        debug!("{}: released", self.info.name);
    }

    pub fn is_open(&self) -> bool {
        self.open.is_open()
    }
}
