// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Static mapping from L2 header byte to logical channel.
//
// Built once when the device is created and never written afterwards, so
// lookups need no synchronisation.

use std::fmt;

use crate::error::{Error, Result};

/// ISI messages, forwarded to the phonet network device.
pub const ISI_MESSAGING: u8 = 0;
pub const RPC_MESSAGING: u8 = 1;
pub const AUDIO_MESSAGING: u8 = 2;
pub const SECURITY_MESSAGING: u8 = 3;
pub const COMMON_LOOPBACK_MESSAGING: u8 = 4;
pub const AUDIO_LOOPBACK_MESSAGING: u8 = 5;

/// Number of logical channels.
pub const CHANNEL_COUNT: usize = 6;

/// Channels whose unread data blocks a suspend, in the order they are checked.
pub const TIME_CRITICAL: [u8; 3] = [RPC_MESSAGING, SECURITY_MESSAGING, ISI_MESSAGING];

/// The physical FIFO a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RxPath {
    /// Common FIFO: ISI, RPC, security and common loopback.
    Common,
    /// Audio FIFO: audio and audio loopback.
    Audio,
}

impl fmt::Display for RxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RxPath::Common => f.write_str("common"),
            RxPath::Audio => f.write_str("audio"),
        }
    }
}

/// Immutable description of one logical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub header: u8,
    pub index: usize,
    pub name: &'static str,
    pub path: RxPath,
}

static CHANNELS: [ChannelInfo; CHANNEL_COUNT] = [
    ChannelInfo {
        header: ISI_MESSAGING,
        index: 0,
        name: "ISI",
        path: RxPath::Common,
    },
    ChannelInfo {
        header: RPC_MESSAGING,
        index: 1,
        name: "RPC",
        path: RxPath::Common,
    },
    ChannelInfo {
        header: AUDIO_MESSAGING,
        index: 2,
        name: "Audio",
        path: RxPath::Audio,
    },
    ChannelInfo {
        header: SECURITY_MESSAGING,
        index: 3,
        name: "Security",
        path: RxPath::Common,
    },
    ChannelInfo {
        header: COMMON_LOOPBACK_MESSAGING,
        index: 4,
        name: "CommonLoopback",
        path: RxPath::Common,
    },
    ChannelInfo {
        header: AUDIO_LOOPBACK_MESSAGING,
        index: 5,
        name: "AudioLoopback",
        path: RxPath::Audio,
    },
];

const NO_CHANNEL: u8 = u8::MAX;

/// Header → channel index table.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    table: [u8; 256],
}

impl ChannelRegistry {
    pub fn new() -> Self {
        let mut table = [NO_CHANNEL; 256];
        for info in &CHANNELS {
            table[info.header as usize] = info.index as u8;
        }
        Self { table }
    }

    /// Channel index for `header`.
    pub fn resolve(&self, header: u8) -> Result<usize> {
        match self.table[header as usize] {
            NO_CHANNEL => Err(Error::UnknownChannel { header }),
            idx => Ok(idx as usize),
        }
    }

    /// Channel index for `header`, which must be routed on `path`.
    pub fn resolve_on(&self, path: RxPath, header: u8) -> Result<usize> {
        let idx = self.resolve(header)?;
        if CHANNELS[idx].path != path {
            return Err(Error::WrongPath { header, path });
        }
        Ok(idx)
    }

    pub fn info(&self, index: usize) -> Option<&'static ChannelInfo> {
        CHANNELS.get(index)
    }

    pub fn channels(&self) -> &'static [ChannelInfo] {
        &CHANNELS
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
