// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Notification channel: one mutex, one condvar, one pending flag.
//!
//! The mutex guards the state of the owning WaitSet (its slot table), so
//! attach/detach and the ready sweep are mutually exclusive. Sources keep a
//! weak [`ChannelSignal`] handle and call [`ChannelSignal::notify`] after
//! flipping their ready flag.
//!
//! # Lost wakeups
//!
//! The waiter clears the pending flag and sweeps every ready flag while it
//! holds the lock, then parks. `notify()` signals under the same lock, so a
//! notification can never land between the waiter's last check and its park.
//!
//! `notify_from_interrupt()` may run on a context that interrupted the lock
//! holder and must not wait for it, so it only *tries* to take the lock.
//! When that try fails the signal can race the waiter parking; the waiter
//! therefore never parks longer than `recheck_interval` without looking at
//! the pending flag again.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Handle sources use to wake the waiter of a channel.
///
/// Implementations must not allocate or panic.
pub trait ChannelSignal: Send + Sync {
    /// Record a pending notification and wake the waiter.
    ///
    /// May briefly wait for the channel lock; never call it while holding
    /// that lock.
    fn notify(&self);

    /// Like [`ChannelSignal::notify`], but never waits for the lock.
    fn notify_from_interrupt(&self);

    /// Stable identifier of the channel (one per WaitSet).
    fn id(&self) -> u64;
}

/// Mutex-protected condition variable carrying a coalescing pending flag.
#[derive(Debug)]
pub struct NotificationChannel<S> {
    id: u64,
    state: Mutex<S>,
    condvar: Condvar,
    pending: AtomicBool,
    recheck_interval: Duration,
}

impl<S> NotificationChannel<S> {
    /// Create a channel guarding `state`.
    pub fn new(state: S, recheck_interval: Duration) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

        Self {
            id,
            state: Mutex::new(state),
            condvar: Condvar::new(),
            pending: AtomicBool::new(false),
            recheck_interval,
        }
    }

    /// Identifier of this channel.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Lock the guarded state.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock()
    }

    /// Mark a notification pending and wake the waiter.
    ///
    /// Safe to call from any thread, repeatedly; calls coalesce until the
    /// waiter observes them. Blocks only while another thread holds the lock
    /// (a sweep or an attach/detach).
    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);
        let _guard = self.state.lock();
        self.condvar.notify_one();
    }

    /// Mark a notification pending and wake the waiter without waiting for
    /// the lock. Wake latency is bounded by the re-check interval.
    pub fn notify_from_interrupt(&self) {
        self.pending.store(true, Ordering::Release);
        let guard = self.state.try_lock();
        self.condvar.notify_one();
        drop(guard);
    }

    /// Longest park before the waiter re-checks the pending flag.
    #[inline]
    pub fn recheck_interval(&self) -> Duration {
        self.recheck_interval
    }

    /// Consume the pending flag, returning whether it was set.
    #[inline]
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Check for a pending notification without consuming it.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Block until `notify()` has been called since the last observation or
    /// `timeout` elapses (`None` waits forever).
    ///
    /// Returns `true` if a notification was observed, `false` on timeout.
    pub fn wait_until_ready_or_timeout(
        &self,
        guard: &mut MutexGuard<'_, S>,
        timeout: Option<Duration>,
    ) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        self.wait_until_ready_or_deadline(guard, deadline)
    }

    /// Same as [`Self::wait_until_ready_or_timeout`] with an absolute deadline.
    pub fn wait_until_ready_or_deadline(
        &self,
        guard: &mut MutexGuard<'_, S>,
        deadline: Option<Instant>,
    ) -> bool {
        loop {
            if self.take_pending() {
                return true;
            }

            let now = Instant::now();
            let recheck_at = now.checked_add(self.recheck_interval);
            match (deadline, recheck_at) {
                (Some(deadline), _) if deadline <= now => return self.take_pending(),
                (Some(deadline), Some(recheck_at)) => {
                    self.condvar.wait_until(guard, deadline.min(recheck_at));
                }
                (Some(deadline), None) => {
                    self.condvar.wait_until(guard, deadline);
                }
                (None, Some(recheck_at)) => {
                    self.condvar.wait_until(guard, recheck_at);
                }
                (None, None) => self.condvar.wait(guard),
            }
        }
    }
}

impl<S: Send> ChannelSignal for NotificationChannel<S> {
    fn notify(&self) {
        NotificationChannel::notify(self);
    }

    fn notify_from_interrupt(&self) {
        NotificationChannel::notify_from_interrupt(self);
    }

    fn id(&self) -> u64 {
        self.id
    }
}
