// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error kinds for the receive path, the consumer side of the queues and the
// suspend decision.

use thiserror::Error;

use crate::registry::RxPath;

/// Errors produced by the shared-memory receive path.
#[derive(Debug, Error)]
pub enum Error {
    /// The L2 header has no entry in the channel registry.
    #[error("unknown channel for L2 header {header:#04x}")]
    UnknownChannel { header: u8 },

    /// The header resolves, but not to a channel served by this FIFO path.
    #[error("L2 header {header:#04x} is not routed on the {path} path")]
    WrongPath { header: u8, path: RxPath },

    /// Accepting the message would exceed the queue's reserved capacity.
    #[error("{channel} queue full: {requested} bytes requested, {pending}/{capacity} pending")]
    QueueFull {
        channel: &'static str,
        requested: usize,
        pending: usize,
        capacity: usize,
    },

    /// A single copy larger than the FIFO region itself.
    #[error("message of {len} bytes exceeds FIFO capacity {capacity}")]
    Oversize { len: usize, capacity: usize },

    /// No message pending on the queue.
    #[error("queue empty")]
    Empty,

    /// The consumer buffer cannot hold the oldest pending message.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Suspend veto, or an exclusive open on a channel already in use.
    #[error("device or resource busy")]
    Busy,

    /// Negative status reported by the network collaborator.
    #[error("network device error {0}")]
    External(i32),

    /// Shared-memory mapping or worker thread failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
