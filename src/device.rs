// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Top-level device context.
//
// One `ShrmDevice` owns everything the receive path touches: the channel
// table, each channel's queue and open count, the ISI receive tasklet and
// the injected collaborators. Interrupt-side code reaches the device through
// `rx_common_l2msg` / `rx_audio_l2msg`; consumers reach their channel
// through `channel`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, info, trace};

use crate::channel::Channel;
use crate::config::ShrmConfig;
use crate::delivery::drain_net_rx;
use crate::error::{Error, Result};
use crate::fifo::{FifoMemory, FifoRegion, HeapMemory};
use crate::net::NetDevice;
use crate::queue::RxQueue;
use crate::registry::{ChannelInfo, ChannelRegistry, RxPath, ISI_MESSAGING};
use crate::tasklet::Tasklet;
use crate::wake::{CaWakeState, WakeSource};

type MemoryFactory = Box<dyn FnMut(&ChannelInfo, usize) -> Result<Box<dyn FifoMemory>>>;

/// Per-path receive counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxStats {
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct PathCounters {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl PathCounters {
    fn snapshot(&self) -> RxStats {
        RxStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Shared-memory modem device: receive side.
pub struct ShrmDevice {
    registry: ChannelRegistry,
    channels: Arc<[Channel]>,
    pub(crate) net: Arc<dyn NetDevice>,
    pub(crate) wake: Arc<dyn WakeSource>,
    netdev_up: AtomicBool,
    net_rx_task: Tasklet,
    common_stats: PathCounters,
    audio_stats: PathCounters,
}

impl ShrmDevice {
    /// Device with heap-backed regions and a worker thread for ISI delivery.
    pub fn new(config: ShrmConfig, net: Arc<dyn NetDevice>) -> Result<Self> {
        Self::builder(config, net).build()
    }

    pub fn builder(config: ShrmConfig, net: Arc<dyn NetDevice>) -> ShrmDeviceBuilder {
        ShrmDeviceBuilder {
            config,
            net,
            wake: None,
            memory: None,
            spawn_worker: true,
        }
    }

    // ------------------------------------------------------------------
    // Receive path
    // ------------------------------------------------------------------

    /// Queue one message that arrived on `path` with L2 header `header`.
    ///
    /// Errors leave every queue untouched and the message is lost; nothing
    /// here retries. Safe to call from interrupt context: no allocation and
    /// the only lock is the destination channel's queue lock.
    pub fn deliver(&self, path: RxPath, header: u8, payload: &[u8]) -> Result<()> {
        let counters = self.counters(path);
        let res = self.copy_to_queue(path, header, payload);
        match res {
            Ok(()) => counters.delivered.fetch_add(1, Ordering::Relaxed),
            Err(_) => counters.dropped.fetch_add(1, Ordering::Relaxed),
        };
        res?;

        if header == ISI_MESSAGING && self.netdev_up() {
            if self.net_rx_task.schedule() {
                debug!("scheduling the net rx tasklet");
            } else {
                trace!("net rx tasklet already pending");
            }
        }
        Ok(())
    }

    fn copy_to_queue(&self, path: RxPath, header: u8, payload: &[u8]) -> Result<()> {
        trace!("{path} receive IN, header {header}, {} bytes", payload.len());
        let idx = self.registry.resolve_on(path, header)?;
        let queue = self.channels[idx].queue();
        // Guard dropped at the end of the statement, on success or error.
        queue.lock().enqueue(payload)?;
        trace!("{path} receive OUT");
        Ok(())
    }

    /// Common FIFO message-pending handler.
    pub fn rx_common_l2msg(&self, header: u8, payload: &[u8]) {
        if let Err(e) = self.deliver(RxPath::Common, header, payload) {
            error!("common receive with l2 header {header} failed: {e}");
        }
    }

    /// Audio FIFO message-pending handler.
    pub fn rx_audio_l2msg(&self, header: u8, payload: &[u8]) {
        if let Err(e) = self.deliver(RxPath::Audio, header, payload) {
            error!("audio receive with l2 header {header} failed: {e}");
        }
    }

    // ------------------------------------------------------------------
    // Network device state
    // ------------------------------------------------------------------

    /// Record whether the network interface is up. ISI traffic schedules the
    /// delivery tasklet only while it is.
    pub fn set_netdev_up(&self, up: bool) {
        self.netdev_up.store(up, Ordering::Release);
        info!("net device {}", if up { "up" } else { "down" });
    }

    pub fn netdev_up(&self) -> bool {
        self.netdev_up.load(Ordering::Acquire)
    }

    /// The ISI delivery tasklet.
    pub fn net_rx_task(&self) -> &Tasklet {
        &self.net_rx_task
    }

    /// Run the ISI delivery tasklet on the calling thread if it is pending.
    pub fn run_net_rx_task(&self) -> bool {
        self.net_rx_task.run_pending()
    }

    /// Bring the network device back after a resume.
    pub fn resume(&self) -> Result<()> {
        debug!("resume");
        self.net.resume()
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// The channel `header` maps to.
    pub fn channel(&self, header: u8) -> Result<&Channel> {
        let idx = self.registry.resolve(header)?;
        Ok(&self.channels[idx])
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Empty every channel queue.
    pub fn reset_queues(&self) {
        for chan in self.channels.iter() {
            chan.queue().reset();
        }
        info!("all channel queues flushed");
    }

    pub fn stats(&self, path: RxPath) -> RxStats {
        self.counters(path).snapshot()
    }

    fn counters(&self, path: RxPath) -> &PathCounters {
        match path {
            RxPath::Common => &self.common_stats,
            RxPath::Audio => &self.audio_stats,
        }
    }

    /// Stop the ISI delivery worker. Also done on drop.
    pub fn shutdown(&self) {
        self.net_rx_task.stop();
    }
}

/// Builder for [`ShrmDevice`].
pub struct ShrmDeviceBuilder {
    config: ShrmConfig,
    net: Arc<dyn NetDevice>,
    wake: Option<Arc<dyn WakeSource>>,
    memory: Option<MemoryFactory>,
    spawn_worker: bool,
}

impl ShrmDeviceBuilder {
    /// Source of the CA_WAKE_REQ state. Defaults to a deasserted
    /// [`CaWakeState`].
    pub fn wake_source(mut self, wake: Arc<dyn WakeSource>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Storage for each channel region, given the channel and the configured
    /// region size. Defaults to heap memory.
    pub fn memory<F>(mut self, factory: F) -> Self
    where
        F: FnMut(&ChannelInfo, usize) -> Result<Box<dyn FifoMemory>> + 'static,
    {
        self.memory = Some(Box::new(factory));
        self
    }

    /// Leave the ISI delivery tasklet without a worker thread; the owner
    /// drives it with [`ShrmDevice::run_net_rx_task`].
    pub fn manual_net_rx(mut self) -> Self {
        self.spawn_worker = false;
        self
    }

    pub fn build(self) -> Result<ShrmDevice> {
        self.config.validate()?;
        let registry = ChannelRegistry::new();

        let mut memory: MemoryFactory = match self.memory {
            Some(factory) => factory,
            None => Box::new(|_: &ChannelInfo, size: usize| -> Result<Box<dyn FifoMemory>> {
                Ok(Box::new(HeapMemory::new(size)))
            }),
        };

        let mut channels = Vec::with_capacity(registry.channels().len());
        for info in registry.channels() {
            let size = self.config.region_size(info.path);
            let mem = memory(info, size)?;
            if mem.len() != size {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} region is {} bytes, expected {size}", info.name, mem.len()),
                )));
            }
            let queue = RxQueue::new(info.name, FifoRegion::new(mem), self.config.max_pending);
            channels.push(Channel::new(info, queue));
        }
        let channels: Arc<[Channel]> = channels.into();

        let isi = registry.resolve(ISI_MESSAGING)?;
        let body = {
            let channels = Arc::clone(&channels);
            let net = Arc::clone(&self.net);
            move || {
                drain_net_rx(net.as_ref(), channels[isi].queue());
            }
        };
        let net_rx_task = if self.spawn_worker {
            Tasklet::spawn(&self.config.task_name, body)?
        } else {
            Tasklet::new(body)
        };

        debug!(
            "shrm device ready: {} channels, common region {} bytes, audio region {} bytes",
            channels.len(),
            self.config.common_fifo_size,
            self.config.audio_fifo_size
        );

        Ok(ShrmDevice {
            registry,
            channels,
            net: self.net,
            wake: self
                .wake
                .unwrap_or_else(|| Arc::new(CaWakeState::new()) as Arc<dyn WakeSource>),
            netdev_up: AtomicBool::new(false),
            net_rx_task,
            common_stats: PathCounters::default(),
            audio_stats: PathCounters::default(),
        })
    }
}
