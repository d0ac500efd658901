// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Receive-side data plane of the shared-memory link between the application
// processor and the modem: L2 header demultiplexing, wraparound copy into
// per-channel queues, deferred ISI delivery and the suspend veto.

mod error;
pub use error::{Error, Result};

pub mod registry;
pub use registry::{ChannelInfo, ChannelRegistry, RxPath};

mod spin_lock;
pub use spin_lock::{SpinGuard, SpinLock};

pub mod fifo;
pub use fifo::{FifoMemory, FifoRegion, HeapMemory};

mod shm;
pub use shm::{ShmMemory, ShmOpenMode};

pub mod queue;
pub use queue::{MsgRecord, QueueState, RxQueue};

mod channel;
pub use channel::{Channel, OpenCount};

mod net;
pub use net::NetDevice;

mod wake;
pub use wake::{CaWakeState, WakeSource};

mod tasklet;
pub use tasklet::Tasklet;

mod delivery;
pub use delivery::{drain_net_rx, DrainOutcome};

mod config;
pub use config::{ShrmConfig, DEFAULT_MAX_PENDING, DEFAULT_REGION_SIZE, SHM_FIFO_SIZE};

mod device;
pub use device::{RxStats, ShrmDevice, ShrmDeviceBuilder};

mod suspend;
