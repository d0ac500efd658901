// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Host-side simulation of the receive path.
//
// Usage:
//   RUST_LOG=debug demo_rx [messages]
//
// Two threads stand in for the common and audio message-pending interrupts
// and push framed messages into a ShrmDevice. A phonet stand-in consumes the
// ISI channel through the deferred tasklet, an RPC consumer reads its own
// queue, and a suspend request is issued before and after the traffic
// drains.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use shrm::registry::{
    AUDIO_LOOPBACK_MESSAGING, AUDIO_MESSAGING, ISI_MESSAGING, RPC_MESSAGING, SECURITY_MESSAGING,
};
use shrm::{CaWakeState, Error, NetDevice, Result, RxQueue, ShrmConfig, ShrmDevice, WakeSource};

const MAX_RCV_LEN: usize = 2048;

/// Phonet stand-in: counts what it is handed.
#[derive(Default)]
struct PhonetSink {
    packets: AtomicUsize,
    bytes: AtomicUsize,
}

impl NetDevice for PhonetSink {
    fn receive_one(&self, queue: &RxQueue) -> i32 {
        let mut buf = [0u8; MAX_RCV_LEN];
        match queue.dequeue(&mut buf) {
            Ok(n) => {
                self.packets.fetch_add(1, Ordering::Relaxed);
                self.bytes.fetch_add(n, Ordering::Relaxed);
                n.max(1) as i32
            }
            Err(Error::Empty) => 0,
            Err(e) => {
                error!("phonet rx failed: {e}");
                -22
            }
        }
    }

    fn suspend(&self) -> Result<()> {
        info!("phonet: suspended");
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        info!("phonet: resumed");
        Ok(())
    }
}

/// Cheap deterministic message sizes without an RNG dependency.
fn next_len(state: &mut u64) -> usize {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    1 + (*state >> 33) as usize % 512
}

fn main() {
    env_logger::init();

    let messages: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    let net = Arc::new(PhonetSink::default());
    let wake = Arc::new(CaWakeState::new());
    let dev = match ShrmDevice::builder(ShrmConfig::new(), Arc::clone(&net) as Arc<dyn NetDevice>)
        .wake_source(Arc::clone(&wake) as Arc<dyn WakeSource>)
        .build()
    {
        Ok(dev) => Arc::new(dev),
        Err(e) => {
            eprintln!("demo_rx: device init failed: {e}");
            std::process::exit(1);
        }
    };
    dev.set_netdev_up(true);

    let rpc_chan = dev.channel(RPC_MESSAGING).map(|c| c.info().index);
    if let Ok(rpc) = dev.channel(RPC_MESSAGING) {
        if let Err(e) = rpc.open() {
            warn!("RPC open failed: {e}");
        }
    }

    // Modem holds CA_WAKE_REQ while it is sending.
    wake.assert();

    let quit = Arc::new(AtomicBool::new(false));
    let rpc_reader = {
        let dev = Arc::clone(&dev);
        let quit = Arc::clone(&quit);
        thread::spawn(move || {
            let Ok(idx) = rpc_chan else { return 0usize };
            let queue = dev.channels()[idx].queue();
            let mut buf = [0u8; MAX_RCV_LEN];
            let mut read = 0usize;
            loop {
                match queue.dequeue(&mut buf) {
                    Ok(_) => read += 1,
                    Err(_) if quit.load(Ordering::Acquire) => break,
                    Err(_) => thread::sleep(Duration::from_micros(200)),
                }
            }
            read
        })
    };

    let common_irq = {
        let dev = Arc::clone(&dev);
        thread::spawn(move || {
            let headers = [ISI_MESSAGING, RPC_MESSAGING, SECURITY_MESSAGING];
            let payload = [0x5Au8; 512];
            let mut state = 0xdead_beef_u64;
            for i in 0..messages {
                let len = next_len(&mut state);
                dev.rx_common_l2msg(headers[i % headers.len()], &payload[..len]);
                if i % 64 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            }
        })
    };

    let audio_irq = {
        let dev = Arc::clone(&dev);
        thread::spawn(move || {
            let frame = [0u8; 160];
            for i in 0..messages / 4 {
                let header = if i % 8 == 0 {
                    AUDIO_LOOPBACK_MESSAGING
                } else {
                    AUDIO_MESSAGING
                };
                dev.rx_audio_l2msg(header, &frame);
            }
        })
    };

    for (name, t) in [("common", common_irq), ("audio", audio_irq)] {
        if t.join().is_err() {
            error!("{name} irq thread panicked");
        }
    }

    match dev.suspend() {
        Ok(()) => println!("suspend while modem busy: allowed"),
        Err(e) => println!("suspend while modem busy: refused ({e})"),
    }

    wake.deassert();
    thread::sleep(Duration::from_millis(50));
    quit.store(true, Ordering::Release);
    let rpc_read = rpc_reader.join().unwrap_or(0);
    if let Ok(rpc) = dev.channel(RPC_MESSAGING) {
        rpc.release();
    }

    match dev.suspend() {
        Ok(()) => println!("suspend after drain: allowed"),
        Err(e) => println!("suspend after drain: refused ({e})"),
    }
    if let Err(e) = dev.resume() {
        error!("resume failed: {e}");
    }

    let common = dev.stats(shrm::RxPath::Common);
    let audio = dev.stats(shrm::RxPath::Audio);
    println!(
        "common: {} delivered, {} dropped; audio: {} delivered, {} dropped",
        common.delivered, common.dropped, audio.delivered, audio.dropped
    );
    println!(
        "phonet: {} packets / {} bytes in {} tasklet runs; rpc reader: {rpc_read} messages",
        net.packets.load(Ordering::Relaxed),
        net.bytes.load(Ordering::Relaxed),
        dev.net_rx_task().runs()
    );
    dev.shutdown();
}
