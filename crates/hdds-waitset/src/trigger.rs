// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Trigger - registration handle binding one source event to one WaitSet.
//!
//! A Trigger is a value: `wait()` hands out clones of the WaitSet's slots.
//! It never owns its source or its WaitSet; both are reached through `Weak`
//! handles, so neither side keeps the other alive.

use crate::config::INVALID_TRIGGER_ID;
use crate::triggerable::{AttachmentTarget, OriginId, TriggerOrigin, Triggerable};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

type ErasedCallback = dyn Fn(Arc<dyn Any + Send + Sync>) + Send + Sync;

/// Callback bound at attach time, erased over the origin's handle type.
#[derive(Clone)]
pub(crate) struct TriggerCallback(Arc<ErasedCallback>);

impl TriggerCallback {
    fn new<T, F>(callback: F) -> Self
    where
        T: Triggerable,
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self(Arc::new(move |origin: Arc<dyn Any + Send + Sync>| {
            if let Ok(origin) = origin.downcast::<T::Origin>() {
                callback(&T::from_origin(origin));
            }
        }))
    }

    fn call(&self, origin: Arc<dyn Any + Send + Sync>) {
        (self.0)(origin);
    }
}

/// What to record with an attachment: a grouping id, a callback, or both.
///
/// ```
/// use hdds_waitset::{TriggerBinding, UserTrigger};
///
/// let grouped: TriggerBinding<UserTrigger> = TriggerBinding::id(123);
/// let with_callback: TriggerBinding<UserTrigger> =
///     TriggerBinding::callback(|trigger: &UserTrigger| trigger.reset_trigger());
/// let ungrouped: TriggerBinding<UserTrigger> = TriggerBinding::default();
/// # let _ = (grouped, with_callback, ungrouped);
/// ```
pub struct TriggerBinding<T> {
    pub(crate) trigger_id: u64,
    pub(crate) callback: Option<TriggerCallback>,
    _origin: PhantomData<fn(&T)>,
}

impl<T: Triggerable> TriggerBinding<T> {
    /// No grouping id, no callback.
    pub fn ungrouped() -> Self {
        Self {
            trigger_id: INVALID_TRIGGER_ID,
            callback: None,
            _origin: PhantomData,
        }
    }

    /// Group under `trigger_id`.
    pub fn id(trigger_id: u64) -> Self {
        Self::ungrouped().with_id(trigger_id)
    }

    /// Bind a callback invoked with the origin by [`Trigger::invoke`].
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::ungrouped().with_callback(callback)
    }

    /// Set the grouping id.
    #[must_use]
    pub fn with_id(mut self, trigger_id: u64) -> Self {
        self.trigger_id = trigger_id;
        self
    }

    /// Set the callback.
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.callback = Some(TriggerCallback::new::<T, F>(callback));
        self
    }
}

impl<T: Triggerable> Default for TriggerBinding<T> {
    fn default() -> Self {
        Self::ungrouped()
    }
}

impl<T: Triggerable> From<u64> for TriggerBinding<T> {
    fn from(trigger_id: u64) -> Self {
        Self::id(trigger_id)
    }
}

impl<T> fmt::Debug for TriggerBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerBinding")
            .field("trigger_id", &self.trigger_id)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// One (origin, event, grouping id, callback) registration of a WaitSet.
#[derive(Clone)]
pub struct Trigger {
    origin: Weak<dyn TriggerOrigin>,
    origin_id: OriginId,
    event: usize,
    event_name: &'static str,
    trigger_id: u64,
    callback: Option<TriggerCallback>,
    waitset: Weak<dyn AttachmentTarget>,
    waitset_id: u64,
}

impl Trigger {
    /// Sentinel id of ungrouped Triggers.
    pub const INVALID_TRIGGER_ID: u64 = INVALID_TRIGGER_ID;

    #[allow(clippy::too_many_arguments)] // private constructor, one call site
    pub(crate) fn new(
        origin: Weak<dyn TriggerOrigin>,
        origin_id: OriginId,
        event: usize,
        event_name: &'static str,
        trigger_id: u64,
        callback: Option<TriggerCallback>,
        waitset: Weak<dyn AttachmentTarget>,
        waitset_id: u64,
    ) -> Self {
        Self {
            origin,
            origin_id,
            event,
            event_name,
            trigger_id,
            callback,
            waitset,
            waitset_id,
        }
    }

    /// Grouping id, or [`Trigger::INVALID_TRIGGER_ID`] when ungrouped.
    #[inline]
    pub fn trigger_id(&self) -> u64 {
        self.trigger_id
    }

    /// Whether the Trigger was attached with an explicit grouping id.
    #[inline]
    pub fn is_grouped(&self) -> bool {
        self.trigger_id != INVALID_TRIGGER_ID
    }

    /// Identity of the source.
    #[inline]
    pub fn origin_id(&self) -> OriginId {
        self.origin_id
    }

    /// Name of the event this Trigger was attached for.
    #[inline]
    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    /// Identifier of the owning WaitSet.
    #[inline]
    pub fn waitset_id(&self) -> u64 {
        self.waitset_id
    }

    /// Whether a callback was bound.
    #[inline]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Identity check against a source handle.
    pub fn does_originate_from<T: Triggerable>(&self, source: &T) -> bool {
        self.origin_id == source.origin_id()
    }

    /// Typed recovery of the source.
    ///
    /// Returns `None` if the source is gone or `T` is not its handle type.
    pub fn origin<T: Triggerable>(&self) -> Option<T> {
        let origin = self.origin.upgrade()?;
        origin
            .into_any()
            .downcast::<T::Origin>()
            .ok()
            .map(T::from_origin)
    }

    /// Call the bound callback with the origin. No-op without callback or
    /// once the source is gone.
    pub fn invoke(&self) {
        let Some(callback) = &self.callback else {
            return;
        };
        if let Some(origin) = self.origin.upgrade() {
            callback.call(origin.into_any());
        }
    }

    /// Whether this registration is still recorded by its WaitSet.
    pub fn is_attached(&self) -> bool {
        self.waitset.strong_count() > 0
            && self.origin.upgrade().is_some_and(|origin| {
                origin
                    .attachment(self.event)
                    .and_then(|cell| cell.waitset_id())
                    == Some(self.waitset_id)
            })
    }

    /// Mark the source event ready and wake the WaitSet.
    ///
    /// No-op once detached. Repeated calls before the next `wait()` coalesce.
    pub fn trigger(&self) {
        if let Some(origin) = self.origin.upgrade() {
            let attached_here = origin
                .attachment(self.event)
                .and_then(|cell| cell.waitset_id())
                == Some(self.waitset_id);
            if attached_here {
                origin.set_triggered(self.event);
            }
        }
    }

    /// Remove this registration from its WaitSet. Idempotent.
    pub fn detach(&self) {
        let removed = self
            .waitset
            .upgrade()
            .is_some_and(|waitset| waitset.release(self.origin_id, self.event));
        if removed {
            if let Some(cell) = self
                .origin
                .upgrade()
                .as_deref()
                .and_then(|origin| origin.attachment(self.event))
            {
                cell.clear_if(self.waitset_id);
            }
        }
    }

    pub(crate) fn matches(&self, origin_id: OriginId, event: usize) -> bool {
        self.origin_id == origin_id && self.event == event
    }

    pub(crate) fn event(&self) -> usize {
        self.event
    }

    pub(crate) fn upgrade_origin(&self) -> Option<Arc<dyn TriggerOrigin>> {
        self.origin.upgrade()
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        self.waitset_id == other.waitset_id
            && self.origin_id == other.origin_id
            && self.event == other.event
    }
}

impl Eq for Trigger {}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("origin", &self.origin_id)
            .field("event", &self.event_name)
            .field("trigger_id", &self.trigger_id)
            .field("has_callback", &self.callback.is_some())
            .field("waitset_id", &self.waitset_id)
            .finish()
    }
}

#[cfg(test)]
mod tests;
