// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// CA_WAKE_REQ: the modem's "communication in progress" line.

use std::sync::atomic::{AtomicBool, Ordering};

/// Read side of the modem wake request line.
pub trait WakeSource: Send + Sync {
    fn wake_requested(&self) -> bool;
}

/// Wake request state as latched by the register layer.
#[derive(Debug, Default)]
pub struct CaWakeState {
    asserted: AtomicBool,
}

impl CaWakeState {
    pub const fn new() -> Self {
        Self {
            asserted: AtomicBool::new(false),
        }
    }

    /// Modem raised CA_WAKE_REQ.
    pub fn assert(&self) {
        self.asserted.store(true, Ordering::Release);
    }

    pub fn deassert(&self) {
        self.asserted.store(false, Ordering::Release);
    }
}

impl WakeSource for CaWakeState {
    fn wake_requested(&self) -> bool {
        self.asserted.load(Ordering::Acquire)
    }
}
