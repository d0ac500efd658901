// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Suspend veto.
//
// RPC, security and ISI traffic is real time: the modem expects an answer on
// the same link within about a second and crashes otherwise. A low-power
// transition is therefore refused while any of those queues holds data a
// consumer will read, or while the modem holds CA_WAKE_REQ high. Data on a
// channel nobody has opened will never be read; in that case every queue is
// flushed and the check carries on.

use log::{debug, info};

use crate::device::ShrmDevice;
use crate::error::{Error, Result};
use crate::registry::TIME_CRITICAL;

impl ShrmDevice {
    /// Refuse with [`Error::Busy`] if a time-critical channel holds unread
    /// data for an open consumer. Flushes all queues when such data belongs
    /// to an unopened channel.
    pub fn check_unread_msgs(&self) -> Result<()> {
        for header in TIME_CRITICAL {
            let chan = self.channel(header)?;
            let queue = chan.queue();
            if queue.is_empty() {
                continue;
            }

            if chan.open_count().probe_unopened() {
                info!("{} device not opened yet, flush queue", chan.name());
                self.reset_queues();
            } else {
                info!(
                    "Some {} msg unread = {}",
                    chan.name(),
                    queue.front_len().unwrap_or(0)
                );
                return Err(Error::Busy);
            }
        }
        Ok(())
    }

    /// Decide a low-power transition request.
    ///
    /// Returns [`Error::Busy`] on veto; otherwise the network device's own
    /// suspend result, unchanged.
    pub fn suspend(&self) -> Result<()> {
        debug!(
            "suspend requested, ca_wake_req = {}",
            self.wake.wake_requested() as u8
        );

        self.check_unread_msgs()?;

        if self.wake.wake_requested() {
            debug!("modem communication in progress, refusing suspend");
            return Err(Error::Busy);
        }
        self.net.suspend()
    }
}
