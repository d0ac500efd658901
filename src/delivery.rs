// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Body of the ISI receive tasklet: hand every queued ISI message to the
// network device.

use log::{error, trace};

use crate::net::NetDevice;
use crate::queue::RxQueue;

/// How one drain pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The device reported an empty queue after `delivered` messages.
    Drained { delivered: usize },
    /// The device failed with `status` after `delivered` messages.
    Failed { delivered: usize, status: i32 },
}

/// Call [`NetDevice::receive_one`] until it reports empty or fails.
///
/// A failure ends the pass; the next enqueue on the ISI channel schedules
/// another one.
pub fn drain_net_rx(net: &dyn NetDevice, queue: &RxQueue) -> DrainOutcome {
    trace!("net rx drain IN");
    let mut delivered = 0usize;
    let outcome = loop {
        match net.receive_one(queue) {
            0 => {
                trace!("len is zero, queue empty");
                break DrainOutcome::Drained { delivered };
            }
            status if status < 0 => {
                error!("net receive failed with {status} after {delivered} messages");
                break DrainOutcome::Failed { delivered, status };
            }
            _ => delivered += 1,
        }
    };
    trace!("net rx drain OUT");
    outcome
}
