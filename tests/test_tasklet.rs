// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Deferred ISI delivery: coalesced scheduling, drain passes and the worker
// thread.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use shrm::registry::ISI_MESSAGING;
use shrm::{drain_net_rx, DrainOutcome, NetDevice, RxPath, ShrmDevice, Tasklet};

use common::{manual_device, small_config, StubNet};

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

#[test]
fn schedule_coalesces_until_run() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let t = Tasklet::new(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!t.run_pending(), "nothing scheduled yet");
    assert!(t.schedule());
    assert!(!t.schedule());
    assert!(!t.schedule());
    assert!(t.is_scheduled());

    assert!(t.run_pending());
    assert!(!t.is_scheduled());
    assert!(!t.run_pending());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(t.runs(), 1);

    assert!(t.schedule(), "schedulable again after a run");
}

#[test]
fn burst_of_isi_messages_drains_in_one_run() {
    let net = StubNet::new();
    let dev = manual_device(&net);
    dev.set_netdev_up(true);

    for i in 0u8..5 {
        dev.deliver(RxPath::Common, ISI_MESSAGING, &[i; 3]).unwrap();
    }
    assert!(dev.net_rx_task().is_scheduled());
    assert_eq!(net.receive_calls.load(Ordering::SeqCst), 0);

    assert!(dev.run_net_rx_task());
    assert!(!dev.run_net_rx_task());

    assert_eq!(dev.net_rx_task().runs(), 1);
    // Five messages plus the call that reported the queue empty.
    assert_eq!(net.receive_calls.load(Ordering::SeqCst), 6);
    let got = net.received();
    assert_eq!(got, (0u8..5).map(|i| vec![i; 3]).collect::<Vec<_>>());
    assert!(dev.channel(ISI_MESSAGING).unwrap().queue().is_empty());
}

#[test]
fn drain_stops_on_error_and_next_run_resumes() {
    let net = StubNet::new();
    let dev = manual_device(&net);
    dev.set_netdev_up(true);
    net.fail_on_call.store(2, Ordering::SeqCst);

    for i in 0u8..3 {
        dev.deliver(RxPath::Common, ISI_MESSAGING, &[i]).unwrap();
    }
    assert!(dev.run_net_rx_task());
    assert_eq!(net.received().len(), 1);
    assert_eq!(
        dev.channel(ISI_MESSAGING).unwrap().queue().pending_count(),
        2
    );

    // A later enqueue schedules the next pass, which picks up the backlog.
    dev.deliver(RxPath::Common, ISI_MESSAGING, &[9]).unwrap();
    assert!(dev.run_net_rx_task());
    assert_eq!(net.received(), vec![vec![0], vec![1], vec![2], vec![9]]);
}

#[test]
fn drain_outcome_reports_counts() {
    let net = StubNet::new();
    let dev = manual_device(&net);
    let isi = dev.channel(ISI_MESSAGING).unwrap().queue();
    isi.enqueue(b"a").unwrap();
    isi.enqueue(b"b").unwrap();

    assert_eq!(
        drain_net_rx(net.as_ref(), isi),
        DrainOutcome::Drained { delivered: 2 }
    );

    isi.enqueue(b"c").unwrap();
    let next_call = net.receive_calls.load(Ordering::SeqCst) + 1;
    net.fail_on_call.store(next_call, Ordering::SeqCst);
    assert_eq!(
        drain_net_rx(net.as_ref(), isi),
        DrainOutcome::Failed {
            delivered: 0,
            status: -5
        }
    );
}

#[test]
fn worker_thread_runs_scheduled_body() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let t = Tasklet::spawn("test-tasklet", move || {
        h.fetch_add(1, Ordering::SeqCst);
    })
    .expect("spawn");

    t.schedule();
    assert!(wait_until(Duration::from_secs(5), || t.runs() == 1));
    t.schedule();
    assert!(wait_until(Duration::from_secs(5), || t.runs() == 2));
    t.stop();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn worker_survives_panicking_body() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let t = Tasklet::spawn("test-tasklet-panic", move || {
        if h.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first run fails");
        }
    })
    .expect("spawn");

    assert!(t.schedule());
    assert!(wait_until(Duration::from_secs(5), || t.runs() == 1));
    assert!(t.schedule());
    assert!(wait_until(Duration::from_secs(5), || t.runs() == 2));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(!t.is_scheduled());
    t.stop();
}

#[test]
fn manual_run_recovers_from_panicking_body() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let t = Tasklet::new(move || {
        if h.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first run fails");
        }
    });

    t.schedule();
    assert!(t.run_pending());
    t.schedule();
    assert!(t.run_pending());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(t.runs(), 2);
}

#[test]
fn device_worker_delivers_isi_traffic() {
    let net = StubNet::new();
    let dev = ShrmDevice::new(small_config(), Arc::clone(&net) as Arc<dyn NetDevice>)
        .expect("device");
    dev.set_netdev_up(true);

    for i in 0u8..12 {
        dev.deliver(RxPath::Common, ISI_MESSAGING, &[i, i]).unwrap();
        if i % 5 == 0 {
            thread::yield_now();
        }
    }

    let all_received = || net.received().len() == 12;
    assert!(wait_until(Duration::from_secs(5), all_received));
    let got = net.received();
    assert_eq!(got, (0u8..12).map(|i| vec![i, i]).collect::<Vec<_>>());
    assert!(dev.net_rx_task().runs() >= 1);
    dev.shutdown();
}
