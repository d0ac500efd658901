// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Interface to the phonet network device that consumes the ISI channel.

use crate::error::Result;
use crate::queue::RxQueue;

/// The network-facing consumer of the ISI channel.
///
/// Registration, the transmit path and the socket layer live on the other
/// side of this trait.
pub trait NetDevice: Send + Sync {
    /// Hand the oldest message on `queue` to the network stack.
    ///
    /// Returns the number of bytes delivered, 0 when the queue is empty, or a
    /// negative status on failure.
    fn receive_one(&self, queue: &RxQueue) -> i32;

    /// Quiesce the device ahead of a low-power transition.
    fn suspend(&self) -> Result<()>;

    fn resume(&self) -> Result<()>;
}
