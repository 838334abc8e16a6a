// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet - blocking wait on many Triggerable sources from one thread.
//!
//! Capacity is a const generic. Slots and wait results live in
//! `heapless::Vec<Trigger, N>`, so neither the sweep nor the returned result
//! touches the heap.
//!
//! ```
//! use hdds_waitset::{Triggerable, TriggerBinding, UserTrigger, UserTriggerEvent, WaitSet};
//! use std::time::Duration;
//!
//! let waitset = WaitSet::<2>::new();
//! let stop = UserTrigger::new();
//! stop.attach_to(&waitset, UserTriggerEvent::Triggered, TriggerBinding::default())?;
//!
//! stop.trigger();
//! let ready = waitset.timed_wait(Duration::from_millis(100));
//! assert_eq!(ready.len(), 1);
//! assert!(ready[0].does_originate_from(&stop));
//! # Ok::<(), hdds_waitset::Error>(())
//! ```

use crate::config::{WaitSetConfig, MIN_WAKE_RECHECK_INTERVAL};
use crate::core::channel::NotificationChannel;
use crate::error::{Error, Result};
use crate::trigger::{Trigger, TriggerBinding};
use crate::triggerable::{AttachmentTarget, OriginId, TriggerEvent, TriggerOrigin, Triggerable};
use parking_lot::MutexGuard;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Bounded sequence of Triggers returned by [`WaitSet::wait`].
pub type TriggerVec<const N: usize> = heapless::Vec<Trigger, N>;

type OriginVec<const N: usize> = heapless::Vec<Arc<dyn TriggerOrigin>, N>;

/// Attached Triggers in attachment order.
#[derive(Debug, Default)]
pub(crate) struct SlotTable<const N: usize> {
    slots: TriggerVec<N>,
}

impl<const N: usize> SlotTable<N> {
    fn position(&self, origin: OriginId, event: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|trigger| trigger.matches(origin, event))
    }

    fn remove(&mut self, origin: OriginId, event: usize) -> Option<Trigger> {
        self.position(origin, event)
            .map(|index| self.slots.remove(index))
    }

    /// Report and reset every ready slot.
    ///
    /// Upgraded origins are parked in `held` so the caller can drop them after
    /// releasing the lock: dropping the last handle of a source detaches it,
    /// which takes this lock again.
    fn collect_ready(&self, held: &mut OriginVec<N>) -> TriggerVec<N> {
        let mut ready = TriggerVec::new();
        for trigger in &self.slots {
            let Some(origin) = trigger.upgrade_origin() else {
                continue;
            };
            if origin.has_triggered(trigger.event()) {
                origin.reset_trigger(trigger.event());
                // Both vectors hold at most N entries, one per slot.
                let _ = ready.push(trigger.clone());
            }
            let _ = held.push(origin);
        }
        ready
    }
}

impl<const N: usize> AttachmentTarget for NotificationChannel<SlotTable<N>> {
    fn release(&self, origin: OriginId, event: usize) -> bool {
        let removed = self.lock().remove(origin, event);
        if removed.is_some() {
            log::debug!(
                "[waitset] released {} event={} waitset={}",
                origin,
                event,
                self.id()
            );
        }
        removed.is_some()
    }
}

/// Fixed-capacity multiplexer returning the Triggers of ready sources.
///
/// A single consumer thread calls [`WaitSet::wait`] or
/// [`WaitSet::timed_wait`]; any thread may attach, detach or trigger.
pub struct WaitSet<const N: usize> {
    channel: Arc<NotificationChannel<SlotTable<N>>>,
}

impl<const N: usize> WaitSet<N> {
    /// Compile-time capacity.
    pub const CAPACITY: usize = N;

    /// Create an empty WaitSet with [`WaitSetConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WaitSetConfig::default())
    }

    /// Create an empty WaitSet with explicit settings.
    ///
    /// A re-check interval below [`MIN_WAKE_RECHECK_INTERVAL`] is raised to it.
    #[must_use]
    pub fn with_config(config: WaitSetConfig) -> Self {
        let mut recheck_interval = config.wake_recheck_interval;
        if config.validate().is_err() {
            log::warn!(
                "[waitset] wake_recheck_interval {:?} below minimum, using {:?}",
                recheck_interval,
                MIN_WAKE_RECHECK_INTERVAL
            );
            recheck_interval = MIN_WAKE_RECHECK_INTERVAL;
        }
        Self {
            channel: Arc::new(NotificationChannel::new(
                SlotTable::default(),
                recheck_interval,
            )),
        }
    }

    /// Identifier shared by every Trigger of this WaitSet.
    pub fn id(&self) -> u64 {
        self.channel.id()
    }

    /// Maximum number of attachments.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of attached Triggers.
    pub fn len(&self) -> usize {
        self.channel.lock().slots.len()
    }

    /// Whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the attached Triggers in attachment order.
    pub fn triggers(&self) -> TriggerVec<N> {
        self.channel.lock().slots.clone()
    }

    /// Attach `event` of `source`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyAttached`] if (source, event) is already attached
    ///   here; nothing changes.
    /// - [`Error::CapacityExceeded`] if all `N` slots are in use.
    /// - [`Error::UnknownEvent`] if the source has no slot for `event`.
    ///
    /// A source event attached to another WaitSet is moved here. On error the
    /// existing attachment, here or elsewhere, is left untouched.
    pub fn attach<T: Triggerable>(
        &self,
        source: &T,
        event: T::Event,
        binding: TriggerBinding<T>,
    ) -> Result<()> {
        let origin = Arc::clone(source.origin());
        let origin_id = origin.origin_id();
        let index = event.index();
        let cell = origin.attachment(index).ok_or(Error::UnknownEvent {
            event: event.name(),
        })?;

        let origin_dyn: Arc<dyn TriggerOrigin> = origin.clone();
        let channel = Arc::downgrade(&self.channel);
        let target: Weak<dyn AttachmentTarget> = channel;
        let trigger = Trigger::new(
            Arc::downgrade(&origin_dyn),
            origin_id,
            index,
            event.name(),
            binding.trigger_id,
            binding.callback,
            target.clone(),
            self.id(),
        );

        // The rejected Trigger (and its callback) is dropped after the lock.
        let (rejected, previous) = {
            let mut table = self.channel.lock();
            if table.position(origin_id, index).is_some() {
                return Err(Error::AlreadyAttached {
                    origin: origin_id,
                    event: event.name(),
                });
            }
            match table.slots.push(trigger) {
                Ok(()) => (None, cell.bind(target, self.id())),
                Err(trigger) => (Some(trigger), None),
            }
        };
        if rejected.is_some() {
            return Err(Error::CapacityExceeded { capacity: N });
        }

        // The previous WaitSet gives up its slot only after this one holds
        // the new slot, and outside our lock since release takes its lock.
        if let Some(previous) = previous.filter(|link| link.waitset_id() != self.id()) {
            log::debug!(
                "[waitset] moving {} event={} from waitset={} to waitset={}",
                origin_id,
                event.name(),
                previous.waitset_id(),
                self.id()
            );
            previous.release(origin_id, index);
        }

        log::debug!(
            "[waitset] attached {} event={} waitset={}",
            origin_id,
            event.name(),
            self.id()
        );

        // A source that was already ready must wake a waiter blocked right now.
        if origin.has_triggered(index) {
            self.channel.notify();
        }

        Ok(())
    }

    /// Detach `event` of `source`. Idempotent; returns whether it was attached.
    pub fn detach<T: Triggerable>(&self, source: &T, event: T::Event) -> bool {
        let origin = source.origin();
        let index = event.index();
        let removed = self.channel.release(origin.origin_id(), index);
        if removed {
            if let Some(cell) = origin.attachment(index) {
                cell.clear_if(self.id());
            }
        }
        removed
    }

    /// Block until at least one attached source is ready.
    ///
    /// Returns the ready Triggers in attachment order and clears their ready
    /// state. With nothing attached this blocks forever; keep a cancellation
    /// [`UserTrigger`](crate::UserTrigger) attached or use
    /// [`WaitSet::timed_wait`].
    pub fn wait(&self) -> TriggerVec<N> {
        self.wait_until(None)
    }

    /// Like [`WaitSet::wait`], but returns an empty result once `timeout`
    /// elapses without any source becoming ready.
    pub fn timed_wait(&self, timeout: Duration) -> TriggerVec<N> {
        self.wait_until(Instant::now().checked_add(timeout))
    }

    fn wait_until(&self, deadline: Option<Instant>) -> TriggerVec<N> {
        let mut table = self.channel.lock();
        loop {
            self.channel.take_pending();

            let mut held = OriginVec::<N>::new();
            let ready = table.collect_ready(&mut held);
            if !held.is_empty() {
                MutexGuard::unlocked(&mut table, || drop(held));
            }

            if !ready.is_empty() {
                log::trace!(
                    "[waitset] wait returning {} trigger(s) waitset={}",
                    ready.len(),
                    self.id()
                );
                return ready;
            }

            if !self
                .channel
                .wait_until_ready_or_deadline(&mut table, deadline)
            {
                log::trace!("[waitset] wait timed out waitset={}", self.id());
                return TriggerVec::new();
            }
        }
    }
}

impl<const N: usize> Default for WaitSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for WaitSet<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitSet")
            .field("id", &self.id())
            .field("capacity", &N)
            .field("attached", &self.len())
            .finish()
    }
}

impl<const N: usize> Drop for WaitSet<N> {
    fn drop(&mut self) {
        let slots = std::mem::take(&mut self.channel.lock().slots);
        let waitset_id = self.id();
        for trigger in &slots {
            if let Some(origin) = trigger.upgrade_origin() {
                if let Some(cell) = origin.attachment(trigger.event()) {
                    cell.clear_if(waitset_id);
                }
            }
        }
        if !slots.is_empty() {
            log::debug!(
                "[waitset] dropped waitset={} detaching {} trigger(s)",
                waitset_id,
                slots.len()
            );
        }
    }
}
