// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscriber - receives samples of one service and signals "has new samples"
//! to an attached WaitSet.
//!
//! # Readiness
//!
//! The ready flag is raised by every delivery and stays raised while samples
//! are queued. It is lowered only once the queue is empty: by the WaitSet
//! sweep that reports a drained subscriber, by [`Subscriber::take`] popping
//! the last sample or by [`Subscriber::release_queued_samples`].
//!
//! A consumer that leaves samples queued after a wakeup is reported again by
//! the next `wait()`; release the samples it does not want.

use crate::config::{validate_queue_capacity, DEFAULT_SUBSCRIBER_QUEUE_CAPACITY};
use crate::error::Result;
use crate::sample::Sample;
use crate::service::ServiceDescription;
use crate::triggerable::{AttachmentCell, OriginId, TriggerEvent, TriggerOrigin, Triggerable};
use crossbeam::queue::ArrayQueue;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Events of a [`Subscriber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberEvent {
    /// Samples are waiting in the queue.
    HasNewSamples,
}

impl TriggerEvent for SubscriberEvent {
    fn index(self) -> usize {
        0
    }

    fn name(self) -> &'static str {
        "has_new_samples"
    }
}

/// Subscription state of a [`Subscriber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeState {
    NotSubscribed,
    Subscribed,
}

/// Per-subscriber settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberOptions {
    /// Maximum number of queued samples; the oldest is dropped on overflow.
    pub queue_capacity: usize,
}

impl Default for SubscriberOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_SUBSCRIBER_QUEUE_CAPACITY,
        }
    }
}

impl SubscriberOptions {
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Receive side shared by a [`Subscriber`]'s handles and the service registry.
pub struct SubscriberPort {
    origin_id: OriginId,
    service: ServiceDescription,
    queue: ArrayQueue<Sample>,
    ready: AtomicBool,
    subscribed: AtomicBool,
    dropped: AtomicU64,
    attachment: AttachmentCell,
}

impl SubscriberPort {
    fn new(service: ServiceDescription, options: SubscriberOptions) -> Result<Self> {
        validate_queue_capacity(options.queue_capacity)?;
        Ok(Self {
            origin_id: OriginId::next(),
            service,
            queue: ArrayQueue::new(options.queue_capacity),
            ready: AtomicBool::new(false),
            subscribed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            attachment: AttachmentCell::new(),
        })
    }

    /// Queue `sample` and signal readiness. Returns `false` (sample discarded)
    /// while not subscribed.
    pub(crate) fn deliver(&self, sample: Sample) -> bool {
        if !self.subscribed.load(Ordering::SeqCst) {
            return false;
        }

        if let Some(oldest) = self.queue.force_push(sample) {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            log::trace!(
                "[subscriber] {} queue full, dropped seq={} (total dropped={})",
                self.origin_id,
                oldest.header().sequence_number,
                dropped
            );
        }

        self.ready.store(true, Ordering::SeqCst);

        // An unsubscribe may have drained the queue between the check above
        // and the push; undo both.
        if !self.subscribed.load(Ordering::SeqCst) {
            self.drain();
            self.clear_ready_if_drained();
            return false;
        }

        self.attachment.notify();
        true
    }

    /// Lower the ready flag unless samples are still queued.
    fn clear_ready_if_drained(&self) {
        if self.queue.is_empty() {
            self.ready.store(false, Ordering::Release);
            // A delivery may have landed between the check and the store.
            if !self.queue.is_empty() {
                self.ready.store(true, Ordering::Release);
            }
        }
    }

    fn drain(&self) -> usize {
        let mut released = 0;
        while self.queue.pop().is_some() {
            released += 1;
        }
        released
    }
}

impl TriggerOrigin for SubscriberPort {
    fn origin_id(&self) -> OriginId {
        self.origin_id
    }

    fn has_triggered(&self, _event: usize) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn reset_trigger(&self, _event: usize) {
        self.clear_ready_if_drained();
    }

    fn set_triggered(&self, _event: usize) {
        if !self.attachment.is_attached() {
            return;
        }
        self.ready.store(true, Ordering::Release);
        self.attachment.notify();
    }

    fn attachment(&self, event: usize) -> Option<&AttachmentCell> {
        (event == 0).then_some(&self.attachment)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for SubscriberPort {
    fn drop(&mut self) {
        self.attachment.release(self.origin_id, 0);
    }
}

impl fmt::Debug for SubscriberPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberPort")
            .field("origin", &self.origin_id)
            .field("service", &self.service)
            .field("queued", &self.queue.len())
            .field("capacity", &self.queue.capacity())
            .field("ready", &self.ready.load(Ordering::Relaxed))
            .field("subscribed", &self.subscribed.load(Ordering::Relaxed))
            .finish()
    }
}

/// Untyped subscriber of one [`ServiceDescription`].
///
/// Created by [`Runtime::create_subscriber`](crate::Runtime::create_subscriber).
/// Clones share the same queue, ready flag and identity.
#[derive(Debug, Clone)]
pub struct Subscriber {
    port: Arc<SubscriberPort>,
}

impl Subscriber {
    pub(crate) fn new(service: ServiceDescription, options: SubscriberOptions) -> Result<Self> {
        Ok(Self {
            port: Arc::new(SubscriberPort::new(service, options)?),
        })
    }

    pub(crate) fn port(&self) -> &Arc<SubscriberPort> {
        &self.port
    }

    /// Start accepting samples.
    pub fn subscribe(&self) {
        if !self.port.subscribed.swap(true, Ordering::AcqRel) {
            log::debug!(
                "[subscriber] {} subscribed to {}",
                self.port.origin_id,
                self.port.service
            );
        }
    }

    /// Stop accepting samples and discard the queued ones.
    pub fn unsubscribe(&self) {
        if self.port.subscribed.swap(false, Ordering::SeqCst) {
            let released = self.release_queued_samples();
            log::debug!(
                "[subscriber] {} unsubscribed from {} (released {})",
                self.port.origin_id,
                self.port.service,
                released
            );
        }
    }

    pub fn subscription_state(&self) -> SubscribeState {
        if self.port.subscribed.load(Ordering::Acquire) {
            SubscribeState::Subscribed
        } else {
            SubscribeState::NotSubscribed
        }
    }

    /// Ready predicate: true while samples are queued, or after an explicit
    /// trigger that no `wait()` has reported yet.
    pub fn has_new_samples(&self) -> bool {
        self.port.has_triggered(0)
    }

    /// Pop the oldest queued sample. Clears readiness once the queue is empty.
    pub fn take(&self) -> Option<Sample> {
        let sample = self.port.queue.pop();
        self.port.clear_ready_if_drained();
        sample
    }

    /// Discard every queued sample and clear readiness, so the next `wait()`
    /// does not report this subscriber again. Returns the number of samples
    /// discarded.
    pub fn release_queued_samples(&self) -> usize {
        let released = self.port.drain();
        self.port.clear_ready_if_drained();
        released
    }

    /// Number of samples waiting in the queue.
    pub fn queued_samples(&self) -> usize {
        self.port.queue.len()
    }

    /// Samples lost to queue overflow since creation.
    pub fn dropped_samples(&self) -> u64 {
        self.port.dropped.load(Ordering::Relaxed)
    }

    pub fn service(&self) -> &ServiceDescription {
        &self.port.service
    }

    /// Whether [`SubscriberEvent::HasNewSamples`] is attached to a live WaitSet.
    pub fn is_attached(&self) -> bool {
        self.port.attachment.is_attached()
    }
}

impl Triggerable for Subscriber {
    type Event = SubscriberEvent;
    type Origin = SubscriberPort;

    fn origin(&self) -> &Arc<SubscriberPort> {
        &self.port
    }

    fn from_origin(origin: Arc<SubscriberPort>) -> Self {
        Self { port: origin }
    }
}
