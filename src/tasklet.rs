// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Deferred work with coalesced scheduling.
//
// A tasklet wraps one body closure and a single pending flag. Scheduling
// sets the flag and wakes the worker only on the false → true edge, so any
// number of triggers before the body runs collapse into one run. The flag is
// cleared before the body starts; a trigger that lands while the body is
// running therefore buys exactly one more run.
//
// `schedule` never blocks and never allocates, so it is safe to call from
// the interrupt-side receive path.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, Thread};

use log::{debug, error, warn};

type Body = Box<dyn Fn() + Send + Sync>;

struct Shared {
    pending: AtomicBool,
    stop: AtomicBool,
    runs: AtomicU64,
    worker: OnceLock<Thread>,
    // Held for the duration of one run of the body.
    running: Mutex<()>,
    body: Body,
}

impl Shared {
    /// A panicking body is logged and counted as a run; the next schedule
    /// runs it again.
    fn run_pending(&self) -> bool {
        let _running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.pending.swap(false, Ordering::AcqRel) {
            return false;
        }
        if panic::catch_unwind(AssertUnwindSafe(|| (self.body)())).is_err() {
            error!("tasklet body panicked");
        }
        self.runs.fetch_add(1, Ordering::Relaxed);
        true
    }
}

/// A unit of deferred work that never runs concurrently with itself.
pub struct Tasklet {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Tasklet {
    /// Tasklet without a worker thread; the owner drives it through
    /// [`run_pending`](Self::run_pending).
    pub fn new<F>(body: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                pending: AtomicBool::new(false),
                stop: AtomicBool::new(false),
                runs: AtomicU64::new(0),
                worker: OnceLock::new(),
                running: Mutex::new(()),
                body: Box::new(body),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Tasklet served by a dedicated worker thread named `name`.
    pub fn spawn<F>(name: &str, body: F) -> io::Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let tasklet = Self::new(body);
        let shared = Arc::clone(&tasklet.shared);
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || worker_loop(&shared))?;
        // Nobody can schedule before we return, so the worker handle is in
        // place before the first unpark is attempted.
        let _ = tasklet.shared.worker.set(handle.thread().clone());
        if let Ok(mut slot) = tasklet.handle.lock() {
            *slot = Some(handle);
        }
        debug!("tasklet worker '{name}' started");
        Ok(tasklet)
    }

    /// Mark the tasklet pending. Returns `true` if this call scheduled it,
    /// `false` if it was already pending.
    pub fn schedule(&self) -> bool {
        if self.shared.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(worker) = self.shared.worker.get() {
            worker.unpark();
        }
        true
    }

    pub fn is_scheduled(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Run the body on the calling thread if the tasklet is pending.
    ///
    /// Meant for tasklets created with [`new`](Self::new); on a spawned
    /// tasklet it competes with the worker for the pending flag. Returns
    /// whether the body ran.
    pub fn run_pending(&self) -> bool {
        self.shared.run_pending()
    }

    /// Completed runs of the body.
    pub fn runs(&self) -> u64 {
        self.shared.runs.load(Ordering::Relaxed)
    }

    /// Stop the worker thread, if any, and wait for it. A run in progress
    /// completes first; a pending run is dropped.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        let handle = match self.handle.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("tasklet worker panicked");
            }
        }
    }
}

impl Drop for Tasklet {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        if shared.stop.load(Ordering::Acquire) {
            break;
        }
        if !shared.run_pending() {
            thread::park();
        }
    }
}
