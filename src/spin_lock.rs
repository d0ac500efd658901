// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Data-owning spin lock for state touched from the interrupt-side receive
// path. Waiters never sleep: backoff escalates from busy spin to a CPU pause
// hint to a thread yield, and stays there.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, Ordering};

/// Adaptive backoff without the sleep stage.
///
/// - k < 4:  busy spin
/// - k < 16: CPU pause hint
/// - k >= 16: thread yield
#[inline]
fn backoff(k: &mut u32) {
    if *k < 4 {
        // busy spin
    } else if *k < 16 {
        std::hint::spin_loop();
    } else {
        std::thread::yield_now();
        return;
    }
    *k += 1;
}

/// A spin lock protecting a value of type `T`.
///
/// Critical sections are expected to be a bounded memory copy plus a list
/// append, so contention resolves within the pause stage in practice.
pub struct SpinLock<T> {
    lc: AtomicU32,
    data: UnsafeCell<T>,
}

impl<T> SpinLock<T> {
    /// Create a new unlocked spin lock around `data`.
    pub const fn new(data: T) -> Self {
        Self {
            lc: AtomicU32::new(0),
            data: UnsafeCell::new(data),
        }
    }

    /// Acquire the lock, spinning with backoff.
    pub fn lock(&self) -> SpinGuard<'_, T> {
        let mut k = 0u32;
        while self.lc.swap(1, Ordering::Acquire) != 0 {
            backoff(&mut k);
        }
        SpinGuard {
            lock: self,
            _marker: PhantomData,
        }
    }

    /// Acquire the lock only if it is free.
    pub fn try_lock(&self) -> Option<SpinGuard<'_, T>> {
        if self.lc.swap(1, Ordering::Acquire) == 0 {
            Some(SpinGuard {
                lock: self,
                _marker: PhantomData,
            })
        } else {
            None
        }
    }

    /// Whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.lc.load(Ordering::Relaxed) != 0
    }

    /// Access the value through an exclusive borrow; no locking needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    fn unlock(&self) {
        self.lc.store(0, Ordering::Release);
    }
}

impl<T: Default> Default for SpinLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// Safety: access to `data` is serialised by `lc`.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

/// RAII guard: the lock is released on drop.
///
/// Hands out `&T` through `Deref`, so sharing the guard across threads
/// requires `T: Sync`:
///
/// ```compile_fail
/// fn assert_sync<S: Sync>() {}
/// assert_sync::<shrm::SpinGuard<'static, std::cell::Cell<u32>>>();
/// ```
pub struct SpinGuard<'a, T> {
    lock: &'a SpinLock<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<T> Deref for SpinGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the guard proves exclusive ownership of the lock.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard proves exclusive ownership of the lock.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
