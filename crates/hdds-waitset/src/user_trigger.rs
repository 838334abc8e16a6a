// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UserTrigger - source whose ready state is under application control.
//!
//! Typically used for cancellation: attach one to the WaitSet, trigger it
//! from another thread (or the Ctrl-C handler) and recognise it with
//! [`Trigger::does_originate_from`](crate::Trigger::does_originate_from).

use crate::triggerable::{AttachmentCell, OriginId, TriggerEvent, TriggerOrigin, Triggerable};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Events of a [`UserTrigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserTriggerEvent {
    /// `trigger()` was called.
    Triggered,
}

impl TriggerEvent for UserTriggerEvent {
    fn index(self) -> usize {
        0
    }

    fn name(self) -> &'static str {
        "triggered"
    }
}

/// Shared state behind a [`UserTrigger`].
#[derive(Debug)]
pub struct UserTriggerState {
    origin_id: OriginId,
    triggered: AtomicBool,
    attachment: AttachmentCell,
}

impl UserTriggerState {
    /// Set the ready flag if attached. Returns whether it was set.
    fn raise(&self) -> bool {
        if !self.attachment.is_attached() {
            return false;
        }
        self.triggered.store(true, Ordering::Release);
        true
    }
}

impl TriggerOrigin for UserTriggerState {
    fn origin_id(&self) -> OriginId {
        self.origin_id
    }

    fn has_triggered(&self, _event: usize) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    fn reset_trigger(&self, _event: usize) {
        self.triggered.store(false, Ordering::Release);
    }

    fn set_triggered(&self, _event: usize) {
        if self.raise() {
            self.attachment.notify();
        }
    }

    fn attachment(&self, event: usize) -> Option<&AttachmentCell> {
        (event == 0).then_some(&self.attachment)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for UserTriggerState {
    fn drop(&mut self) {
        self.attachment.release(self.origin_id, 0);
    }
}

/// Application-controlled event source.
///
/// Clones share one identity and one ready flag.
#[derive(Debug, Clone)]
pub struct UserTrigger {
    inner: Arc<UserTriggerState>,
}

impl UserTrigger {
    /// Create an unattached, untriggered UserTrigger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(UserTriggerState {
                origin_id: OriginId::next(),
                triggered: AtomicBool::new(false),
                attachment: AttachmentCell::new(),
            }),
        }
    }

    /// Mark ready and wake the attached WaitSet.
    ///
    /// No-op while unattached. Repeated calls before the next `wait()`
    /// coalesce into one report.
    pub fn trigger(&self) {
        self.inner.set_triggered(0);
    }

    /// Like [`UserTrigger::trigger`], but never waits for the WaitSet lock,
    /// so it may run on a context that interrupted the waiting thread.
    pub fn trigger_from_interrupt(&self) {
        if self.inner.raise() {
            self.inner.attachment.notify_from_interrupt();
        }
    }

    /// Whether a trigger is pending (not yet reported or reset).
    pub fn has_triggered(&self) -> bool {
        self.inner.has_triggered(0)
    }

    /// Clear a pending trigger without it being reported by `wait()`.
    pub fn reset_trigger(&self) {
        self.inner.reset_trigger(0);
    }

    /// Whether this trigger is attached to a live WaitSet.
    pub fn is_attached(&self) -> bool {
        self.inner.attachment.is_attached()
    }
}

impl Default for UserTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Triggerable for UserTrigger {
    type Event = UserTriggerEvent;
    type Origin = UserTriggerState;

    fn origin(&self) -> &Arc<UserTriggerState> {
        &self.inner
    }

    fn from_origin(origin: Arc<UserTriggerState>) -> Self {
        Self { inner: origin }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TriggerBinding;
    use crate::waitset::WaitSet;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_noop_when_unattached() {
        let trigger = UserTrigger::new();
        trigger.trigger();
        assert!(!trigger.has_triggered());
        assert!(!trigger.is_attached());
    }

    #[test]
    fn test_trigger_and_reset() {
        let waitset = WaitSet::<1>::new();
        let trigger = UserTrigger::new();
        trigger
            .attach_to(&waitset, UserTriggerEvent::Triggered, TriggerBinding::default())
            .expect("attach should succeed");

        trigger.trigger();
        assert!(trigger.has_triggered());

        trigger.reset_trigger();
        assert!(!trigger.has_triggered());
        assert!(waitset.timed_wait(Duration::from_millis(20)).is_empty());
    }

    #[test]
    fn test_clones_share_identity() {
        let a = UserTrigger::new();
        let b = a.clone();
        let c = UserTrigger::new();
        assert_eq!(a.origin_id(), b.origin_id());
        assert_ne!(a.origin_id(), c.origin_id());
    }

    #[test]
    fn test_detach_from_source_side() {
        let waitset = WaitSet::<2>::new();
        let trigger = UserTrigger::new();
        trigger
            .attach_to(&waitset, UserTriggerEvent::Triggered, TriggerBinding::id(1))
            .expect("attach should succeed");
        assert!(trigger.is_event_attached(UserTriggerEvent::Triggered));

        assert!(trigger.detach(UserTriggerEvent::Triggered));
        assert!(!trigger.detach(UserTriggerEvent::Triggered));
        assert!(waitset.is_empty());
        assert!(!trigger.is_attached());
    }
}
