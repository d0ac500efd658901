// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shrm::{Error, NetDevice, Result, RxQueue, ShrmConfig, ShrmDevice};

/// Network device that drains the ISI queue into memory.
#[derive(Default)]
pub struct StubNet {
    pub receive_calls: AtomicUsize,
    pub suspend_calls: AtomicUsize,
    pub resume_calls: AtomicUsize,
    /// 0 → suspend succeeds, otherwise `Error::External(code)`.
    pub suspend_status: AtomicI32,
    /// Fail `receive_one` with -5 on this call number (1-based), 0 = never.
    pub fail_on_call: AtomicUsize,
    pub received: Mutex<Vec<Vec<u8>>>,
}

impl StubNet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }
}

impl NetDevice for StubNet {
    fn receive_one(&self, queue: &RxQueue) -> i32 {
        let call = self.receive_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call.load(Ordering::SeqCst) == call {
            return -5;
        }
        let mut buf = [0u8; 2048];
        match queue.dequeue(&mut buf) {
            Ok(n) => {
                self.received.lock().unwrap().push(buf[..n].to_vec());
                // Zero-length messages still count as one delivered message.
                n.max(1) as i32
            }
            Err(Error::Empty) => 0,
            Err(_) => -22,
        }
    }

    fn suspend(&self) -> Result<()> {
        self.suspend_calls.fetch_add(1, Ordering::SeqCst);
        match self.suspend_status.load(Ordering::SeqCst) {
            0 => Ok(()),
            code => Err(Error::External(code)),
        }
    }

    fn resume(&self) -> Result<()> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn small_config() -> ShrmConfig {
    ShrmConfig::new()
        .with_common_fifo_size(64)
        .with_audio_fifo_size(32)
        .with_max_pending(16)
}

/// Device whose ISI tasklet is driven by the test itself.
pub fn manual_device(net: &Arc<StubNet>) -> ShrmDevice {
    ShrmDevice::builder(small_config(), Arc::clone(net) as Arc<dyn NetDevice>)
        .manual_net_rx()
        .build()
        .expect("build device")
}

/// Everything observable about one channel queue.
#[derive(Debug, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub bytes: Vec<u8>,
    pub records: Vec<shrm::MsgRecord>,
    pub write_offset: usize,
    pub unread: usize,
}

pub fn snapshot(dev: &ShrmDevice) -> Vec<QueueSnapshot> {
    dev.channels()
        .iter()
        .map(|chan| {
            let q = chan.queue().lock();
            QueueSnapshot {
                bytes: q.fifo().as_bytes().to_vec(),
                records: q.records().copied().collect(),
                write_offset: q.write_offset(),
                unread: q.peek_pending_size(),
            }
        })
        .collect()
}

/// Pop every message currently on `queue`.
pub fn drain(queue: &RxQueue) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; 4096];
    while let Ok(n) = queue.dequeue(&mut buf) {
        out.push(buf[..n].to_vec());
    }
    out
}
