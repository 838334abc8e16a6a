// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publisher - writes samples of one service to every subscribed subscriber.

use crate::runtime::ServiceRegistry;
use crate::sample::{Sample, SampleHeader};
use crate::service::ServiceDescription;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Send side of one [`ServiceDescription`].
///
/// Created by [`Runtime::create_publisher`](crate::Runtime::create_publisher),
/// already offering.
pub struct Publisher {
    id: u64,
    service: ServiceDescription,
    registry: Arc<ServiceRegistry>,
    sequence: AtomicU64,
    offered: AtomicBool,
}

impl Publisher {
    pub(crate) fn new(id: u64, service: ServiceDescription, registry: Arc<ServiceRegistry>) -> Self {
        Self {
            id,
            service,
            registry,
            sequence: AtomicU64::new(0),
            offered: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn service(&self) -> &ServiceDescription {
        &self.service
    }

    /// Resume publishing after [`Publisher::stop_offer`].
    pub fn offer(&self) {
        if !self.offered.swap(true, Ordering::AcqRel) {
            log::debug!("[publisher] #{} offering {}", self.id, self.service);
        }
    }

    /// Stop publishing; `publish()` delivers nothing until `offer()`.
    pub fn stop_offer(&self) {
        if self.offered.swap(false, Ordering::AcqRel) {
            log::debug!("[publisher] #{} stopped offering {}", self.id, self.service);
        }
    }

    pub fn is_offered(&self) -> bool {
        self.offered.load(Ordering::Acquire)
    }

    /// Copy `payload` once into a shared sample and deliver it to every
    /// subscribed subscriber of the service.
    ///
    /// Returns the number of subscribers that received it (0 while not
    /// offered).
    pub fn publish(&self, payload: &[u8]) -> usize {
        if !self.is_offered() {
            log::trace!("[publisher] #{} publish while not offered, dropped", self.id);
            return 0;
        }

        let sequence_number = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let sample = Sample::new(
            SampleHeader {
                payload_size: payload.len(),
                sequence_number,
                publisher_id: self.id,
            },
            Arc::from(payload),
        );

        let delivered = self.registry.deliver(&self.service, &sample);
        log::trace!(
            "[publisher] #{} seq={} len={} -> {} subscriber(s)",
            self.id,
            sequence_number,
            payload.len(),
            delivered
        );
        delivered
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("id", &self.id)
            .field("service", &self.service)
            .field("offered", &self.is_offered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RuntimeConfig;
    use crate::runtime::Runtime;
    use crate::service::ServiceDescription;

    fn setup() -> (Runtime, ServiceDescription) {
        let runtime = Runtime::new(RuntimeConfig::new("/publisher-test")).unwrap();
        let service = ServiceDescription::new("Radar", "FrontLeft", "Counter").unwrap();
        (runtime, service)
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let (runtime, service) = setup();
        let sub = runtime.create_subscriber(service.clone()).unwrap();
        sub.subscribe();
        let publisher = runtime.create_publisher(service);

        publisher.publish(b"a");
        publisher.publish(b"bc");

        let first = sub.take().unwrap();
        let second = sub.take().unwrap();
        assert_eq!(first.header().sequence_number, 1);
        assert_eq!(second.header().sequence_number, 2);
        assert_eq!(second.header().payload_size, 2);
        assert_eq!(second.header().publisher_id, publisher.id());
        assert_eq!(second.payload(), b"bc");
    }

    #[test]
    fn test_stop_offer_suppresses_delivery() {
        let (runtime, service) = setup();
        let sub = runtime.create_subscriber(service.clone()).unwrap();
        sub.subscribe();
        let publisher = runtime.create_publisher(service);

        publisher.stop_offer();
        assert!(!publisher.is_offered());
        assert_eq!(publisher.publish(b"x"), 0);
        assert_eq!(sub.queued_samples(), 0);

        publisher.offer();
        assert_eq!(publisher.publish(b"x"), 1);
    }

    #[test]
    fn test_payload_shared_between_subscribers() {
        let (runtime, service) = setup();
        let a = runtime.create_subscriber(service.clone()).unwrap();
        let b = runtime.create_subscriber(service.clone()).unwrap();
        a.subscribe();
        b.subscribe();
        let publisher = runtime.create_publisher(service);

        assert_eq!(publisher.publish(&[9; 16]), 2);
        let from_a = a.take().unwrap();
        let from_b = b.take().unwrap();
        assert_eq!(from_a.payload_ptr(), from_b.payload_ptr());
    }
}
