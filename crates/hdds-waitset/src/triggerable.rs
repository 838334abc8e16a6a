// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Triggerable capability - the contract an event source satisfies to be
//! attached to a [`WaitSet`](crate::WaitSet).
//!
//! A source is split in two:
//!
//! - the *origin* ([`TriggerOrigin`]): shared state owning the ready flags and
//!   one [`AttachmentCell`] per event. WaitSets only ever hold a `Weak` to it.
//! - the *handle* ([`Triggerable`]): what user code holds and what callbacks
//!   and [`Trigger::origin`](crate::Trigger::origin) hand back.
//!
//! The capability set is exactly: a ready predicate
//! ([`TriggerOrigin::has_triggered`]), a reset
//! ([`TriggerOrigin::reset_trigger`]) and the ability to produce a Trigger
//! (attaching through [`Triggerable::attach_to`]).

use crate::core::channel::ChannelSignal;
use crate::error::Result;
use crate::trigger::TriggerBinding;
use crate::waitset::WaitSet;
use arc_swap::ArcSwapOption;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Opaque identity of an event source. Only compared, never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OriginId(u64);

impl OriginId {
    /// Allocate a process-unique origin identity.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value (for logging).
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "origin#{}", self.0)
    }
}

/// Event selector of a source type (e.g. `SubscriberEvent::HasNewSamples`).
pub trait TriggerEvent: Copy + fmt::Debug + Send + Sync + 'static {
    /// Dense index of this event in the source's attachment table.
    fn index(self) -> usize;

    /// Human-readable event name used in errors and logs.
    fn name(self) -> &'static str;
}

/// Shared state behind an attachable source.
pub trait TriggerOrigin: Any + Send + Sync {
    /// Identity of this source.
    fn origin_id(&self) -> OriginId;

    /// Ready predicate for `event`.
    fn has_triggered(&self, event: usize) -> bool;

    /// Clear the ready state of `event` after a WaitSet reported it.
    fn reset_trigger(&self, event: usize);

    /// Mark `event` ready and notify its WaitSet; no-op when not attached.
    fn set_triggered(&self, event: usize);

    /// Attachment record for `event`, `None` if the event is not supported.
    fn attachment(&self, event: usize) -> Option<&AttachmentCell>;

    /// Erase to `Any` for typed recovery.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// User-facing source handle.
///
/// Handles are cheap to rebuild from their origin; every handle built from the
/// same origin shares its identity.
pub trait Triggerable: Sized + Send + Sync + 'static {
    /// Event selector type.
    type Event: TriggerEvent;
    /// Shared origin state type.
    type Origin: TriggerOrigin;

    /// Shared origin state.
    fn origin(&self) -> &Arc<Self::Origin>;

    /// Rebuild a handle around an origin.
    fn from_origin(origin: Arc<Self::Origin>) -> Self;

    /// Identity of this source.
    fn origin_id(&self) -> OriginId {
        self.origin().origin_id()
    }

    /// Attach `event` of this source to `waitset`.
    fn attach_to<const N: usize>(
        &self,
        waitset: &WaitSet<N>,
        event: Self::Event,
        binding: TriggerBinding<Self>,
    ) -> Result<()> {
        waitset.attach(self, event, binding)
    }

    /// Detach `event` from whichever WaitSet it is attached to.
    ///
    /// Idempotent; returns whether an attachment was removed.
    fn detach(&self, event: Self::Event) -> bool {
        let origin = self.origin();
        origin
            .attachment(event.index())
            .is_some_and(|cell| cell.release(origin.origin_id(), event.index()))
    }

    /// Whether `event` is currently attached to a live WaitSet.
    fn is_event_attached(&self, event: Self::Event) -> bool {
        self.origin()
            .attachment(event.index())
            .is_some_and(AttachmentCell::is_attached)
    }
}

/// WaitSet side of an attachment, reachable from the source.
pub(crate) trait AttachmentTarget: ChannelSignal {
    /// Remove the slot for (origin, event). Returns whether one was removed.
    fn release(&self, origin: OriginId, event: usize) -> bool;
}

/// One event's link to the WaitSet it is attached to.
pub(crate) struct AttachmentLink {
    target: Weak<dyn AttachmentTarget>,
    waitset_id: u64,
}

impl AttachmentLink {
    pub(crate) fn waitset_id(&self) -> u64 {
        self.waitset_id
    }

    /// Remove the slot this link points at, if that WaitSet is still alive.
    pub(crate) fn release(&self, origin: OriginId, event: usize) -> bool {
        self.target
            .upgrade()
            .is_some_and(|target| target.release(origin, event))
    }
}

/// Records which WaitSet, if any, one event of a source is attached to.
///
/// Reads are lock-free (`ArcSwapOption`), so
/// [`AttachmentCell::notify_from_interrupt`] can run on interrupt paths.
#[derive(Default)]
pub struct AttachmentCell {
    link: ArcSwapOption<AttachmentLink>,
}

impl AttachmentCell {
    /// Create an unattached cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cell points at a live WaitSet.
    pub fn is_attached(&self) -> bool {
        let guard = self.link.load();
        (*guard)
            .as_ref()
            .is_some_and(|link| link.target.strong_count() > 0)
    }

    /// Wake the attached WaitSet. Returns `false` when not attached.
    pub fn notify(&self) -> bool {
        self.signal(|target| target.notify())
    }

    /// Wake the attached WaitSet without waiting for its lock.
    pub fn notify_from_interrupt(&self) -> bool {
        self.signal(|target| target.notify_from_interrupt())
    }

    fn signal(&self, notify: impl FnOnce(&dyn AttachmentTarget)) -> bool {
        let guard = self.link.load();
        let Some(link) = (*guard).as_ref() else {
            return false;
        };
        match link.target.upgrade() {
            Some(target) => {
                notify(&*target);
                true
            }
            None => false,
        }
    }

    /// Detach from the current WaitSet, if any. Returns whether a slot was
    /// removed. Sources call this from `Drop`.
    pub fn release(&self, origin: OriginId, event: usize) -> bool {
        self.link
            .swap(None)
            .is_some_and(|link| link.release(origin, event))
    }

    pub(crate) fn waitset_id(&self) -> Option<u64> {
        self.link
            .load_full()
            .filter(|link| link.target.strong_count() > 0)
            .map(|link| link.waitset_id)
    }

    /// Point the cell at a new WaitSet, returning the previous link.
    pub(crate) fn bind(
        &self,
        target: Weak<dyn AttachmentTarget>,
        waitset_id: u64,
    ) -> Option<Arc<AttachmentLink>> {
        self.link
            .swap(Some(Arc::new(AttachmentLink { target, waitset_id })))
    }

    /// Clear the link only if it still points at `waitset_id`.
    pub(crate) fn clear_if(&self, waitset_id: u64) {
        self.link.rcu(|current| match current {
            Some(link) if link.waitset_id == waitset_id => None,
            other => other.clone(),
        });
    }
}

impl fmt::Debug for AttachmentCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentCell")
            .field("waitset_id", &self.waitset_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_ids_unique() {
        let a = OriginId::next();
        let b = OriginId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_unattached_cell() {
        let cell = AttachmentCell::new();
        assert!(!cell.is_attached());
        assert!(!cell.notify());
        assert!(!cell.notify_from_interrupt());
        assert!(!cell.release(OriginId::next(), 0));
        assert_eq!(cell.waitset_id(), None);
    }
}
