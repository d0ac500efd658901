// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Device configuration.

use std::io;

use crate::registry::RxPath;

/// Size of each shared-memory FIFO window on the modem side.
pub const SHM_FIFO_SIZE: usize = 0x20000;

/// Default region size for a channel queue (a quarter of the FIFO window).
pub const DEFAULT_REGION_SIZE: usize = SHM_FIFO_SIZE / 4;

/// Default upper bound on messages pending per channel.
pub const DEFAULT_MAX_PENDING: usize = 256;

/// Sizing and naming for one [`ShrmDevice`](crate::ShrmDevice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShrmConfig {
    /// Region size for channels on the common FIFO path, in bytes.
    pub common_fifo_size: usize,
    /// Region size for channels on the audio FIFO path, in bytes.
    pub audio_fifo_size: usize,
    /// Most messages a single channel queue may hold. Reserved up front.
    pub max_pending: usize,
    /// Name of the ISI receive worker thread.
    pub task_name: String,
}

impl ShrmConfig {
    pub fn new() -> Self {
        Self {
            common_fifo_size: DEFAULT_REGION_SIZE,
            audio_fifo_size: DEFAULT_REGION_SIZE,
            max_pending: DEFAULT_MAX_PENDING,
            task_name: "shrm-net-rx".to_owned(),
        }
    }

    pub fn with_common_fifo_size(mut self, size: usize) -> Self {
        self.common_fifo_size = size;
        self
    }

    pub fn with_audio_fifo_size(mut self, size: usize) -> Self {
        self.audio_fifo_size = size;
        self
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn with_task_name(mut self, name: &str) -> Self {
        self.task_name = name.to_owned();
        self
    }

    /// Region size for a channel served by `path`.
    pub fn region_size(&self, path: RxPath) -> usize {
        match path {
            RxPath::Common => self.common_fifo_size,
            RxPath::Audio => self.audio_fifo_size,
        }
    }

    pub fn validate(&self) -> io::Result<()> {
        if self.common_fifo_size == 0 || self.audio_fifo_size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "FIFO region size is 0"));
        }
        if self.max_pending == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "max_pending is 0"));
        }
        Ok(())
    }
}

impl Default for ShrmConfig {
    fn default() -> Self {
        Self::new()
    }
}
