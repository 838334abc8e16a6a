// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime - process identity and the in-process service registry that
//! connects publishers to subscribers.
//!
//! Either build private runtimes with [`Runtime::new`] (tests, embedding) or
//! establish the process-wide one once with [`Runtime::init`].

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::publisher::Publisher;
use crate::sample::Sample;
use crate::service::ServiceDescription;
use crate::subscriber::{Subscriber, SubscriberOptions, SubscriberPort};
use crate::triggerable::TriggerOrigin;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Subscribers per service. Holds only `Weak` ports: a dropped subscriber
/// disappears from delivery without unregistering.
#[derive(Debug, Default)]
pub(crate) struct ServiceRegistry {
    subscribers: DashMap<ServiceDescription, Vec<Weak<SubscriberPort>>>,
}

impl ServiceRegistry {
    fn register(&self, service: ServiceDescription, port: &Arc<SubscriberPort>) {
        let mut ports = self.subscribers.entry(service).or_default();
        ports.retain(|weak| weak.strong_count() > 0);
        ports.push(Arc::downgrade(port));
    }

    /// Hand `sample` to every live, subscribed port of `service`.
    /// Returns the number of ports that accepted it.
    pub(crate) fn deliver(&self, service: &ServiceDescription, sample: &Sample) -> usize {
        let mut delivered = 0;
        let mut stale = false;

        if let Some(ports) = self.subscribers.get(service) {
            for weak in ports.iter() {
                match weak.upgrade() {
                    Some(port) => {
                        if port.deliver(sample.clone()) {
                            delivered += 1;
                        }
                    }
                    None => stale = true,
                }
            }
        }

        if stale {
            if let Some(mut ports) = self.subscribers.get_mut(service) {
                ports.retain(|weak| weak.strong_count() > 0);
            }
        }

        delivered
    }

    fn live_subscribers(&self, service: &ServiceDescription) -> usize {
        self.subscribers.get(service).map_or(0, |ports| {
            ports.iter().filter(|weak| weak.strong_count() > 0).count()
        })
    }
}

#[derive(Debug)]
struct RuntimeInner {
    config: RuntimeConfig,
    registry: Arc<ServiceRegistry>,
    next_publisher_id: AtomicU64,
}

/// Process identity plus the service registry. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Create a standalone runtime.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if `config` fails validation.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "[runtime] created '{}' (subscriber queue capacity={})",
            config.app_name,
            config.subscriber_queue_capacity
        );
        Ok(Self {
            inner: Arc::new(RuntimeInner {
                config,
                registry: Arc::new(ServiceRegistry::default()),
                next_publisher_id: AtomicU64::new(1),
            }),
        })
    }

    /// Establish the process-wide runtime under `app_name`.
    ///
    /// Calling it again with the same name returns the existing runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::RuntimeAlreadyInitialized`] if it was initialized under a
    ///   different name.
    /// - [`Error::InvalidConfig`] if `app_name` is empty or too long.
    pub fn init(app_name: &str) -> Result<Self> {
        if let Some(existing) = RUNTIME.get() {
            return existing.same_name(app_name);
        }

        let candidate = Self::new(RuntimeConfig::new(app_name))?;
        let runtime = RUNTIME.get_or_init(|| candidate);
        let runtime = runtime.same_name(app_name)?;
        log::info!("[runtime] initialized '{}'", runtime.name());
        Ok(runtime)
    }

    /// The process-wide runtime.
    ///
    /// # Errors
    ///
    /// [`Error::RuntimeNotInitialized`] before [`Runtime::init`].
    pub fn get() -> Result<Self> {
        RUNTIME.get().cloned().ok_or(Error::RuntimeNotInitialized)
    }

    fn same_name(&self, app_name: &str) -> Result<Self> {
        if self.name() == app_name {
            Ok(self.clone())
        } else {
            Err(Error::RuntimeAlreadyInitialized(self.name().to_string()))
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.config.app_name
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Create a subscriber with the runtime's default queue capacity.
    pub fn create_subscriber(&self, service: ServiceDescription) -> Result<Subscriber> {
        let options = SubscriberOptions::default()
            .with_queue_capacity(self.inner.config.subscriber_queue_capacity);
        self.create_subscriber_with(service, options)
    }

    /// Create a subscriber with explicit options.
    ///
    /// The subscriber starts unsubscribed; call
    /// [`Subscriber::subscribe`] to receive samples.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the queue capacity is out of range.
    pub fn create_subscriber_with(
        &self,
        service: ServiceDescription,
        options: SubscriberOptions,
    ) -> Result<Subscriber> {
        let subscriber = Subscriber::new(service.clone(), options)?;
        log::debug!(
            "[runtime] '{}' created subscriber {} for {}",
            self.name(),
            subscriber.port().origin_id(),
            service
        );
        self.inner.registry.register(service, subscriber.port());
        Ok(subscriber)
    }

    /// Create a publisher; it offers its service immediately.
    pub fn create_publisher(&self, service: ServiceDescription) -> Publisher {
        let id = self.inner.next_publisher_id.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "[runtime] '{}' created publisher #{} for {}",
            self.name(),
            id,
            service
        );
        Publisher::new(id, service, Arc::clone(&self.inner.registry))
    }

    /// Number of live subscribers registered for `service`.
    pub fn subscriber_count(&self, service: &ServiceDescription) -> usize {
        self.inner.registry.live_subscribers(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::SubscribeState;

    fn radar() -> ServiceDescription {
        ServiceDescription::new("Radar", "FrontLeft", "Counter").unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(Runtime::new(RuntimeConfig::new("")).is_err());
    }

    #[test]
    fn test_global_init() {
        // Only test in this binary touching the process-wide runtime.
        assert_eq!(Runtime::get().unwrap_err(), Error::RuntimeNotInitialized);

        let runtime = Runtime::init("/hdds-waitset-unit").unwrap();
        assert_eq!(runtime.name(), "/hdds-waitset-unit");

        let again = Runtime::init("/hdds-waitset-unit").unwrap();
        assert_eq!(again.name(), runtime.name());

        assert_eq!(
            Runtime::init("/other").unwrap_err(),
            Error::RuntimeAlreadyInitialized("/hdds-waitset-unit".into())
        );
        assert_eq!(Runtime::get().unwrap().name(), "/hdds-waitset-unit");
    }

    #[test]
    fn test_publish_reaches_subscribed_only() {
        let runtime = Runtime::new(RuntimeConfig::new("/registry")).unwrap();
        let a = runtime.create_subscriber(radar()).unwrap();
        let b = runtime.create_subscriber(radar()).unwrap();
        a.subscribe();
        assert_eq!(b.subscription_state(), SubscribeState::NotSubscribed);

        let publisher = runtime.create_publisher(radar());
        assert_eq!(publisher.publish(&[1, 2, 3]), 1);
        assert_eq!(a.queued_samples(), 1);
        assert_eq!(b.queued_samples(), 0);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let runtime = Runtime::new(RuntimeConfig::new("/prune")).unwrap();
        let kept = runtime.create_subscriber(radar()).unwrap();
        kept.subscribe();
        {
            let gone = runtime.create_subscriber(radar()).unwrap();
            gone.subscribe();
            assert_eq!(runtime.subscriber_count(&radar()), 2);
        }

        let publisher = runtime.create_publisher(radar());
        assert_eq!(publisher.publish(b"x"), 1);
        assert_eq!(runtime.subscriber_count(&radar()), 1);
        assert_eq!(runtime.inner.registry.subscribers.get(&radar()).unwrap().len(), 1);
    }

    #[test]
    fn test_register_prunes_dropped_subscribers() {
        let runtime = Runtime::new(RuntimeConfig::new("/prune-on-register")).unwrap();
        for _ in 0..100 {
            drop(runtime.create_subscriber(radar()).unwrap());
        }
        let kept = runtime.create_subscriber(radar()).unwrap();

        assert_eq!(runtime.subscriber_count(kept.service()), 1);
        assert_eq!(runtime.inner.registry.subscribers.get(&radar()).unwrap().len(), 1);
    }

    #[test]
    fn test_other_service_not_delivered() {
        let runtime = Runtime::new(RuntimeConfig::new("/isolation")).unwrap();
        let sub = runtime.create_subscriber(radar()).unwrap();
        sub.subscribe();

        let other = ServiceDescription::new("Radar", "FrontRight", "Counter").unwrap();
        let publisher = runtime.create_publisher(other);
        assert_eq!(publisher.publish(b"x"), 0);
        assert!(!sub.port().has_triggered(0));
    }

    #[test]
    fn test_default_queue_capacity_from_config() {
        let config = RuntimeConfig::new("/capacity").with_subscriber_queue_capacity(2);
        let runtime = Runtime::new(config).unwrap();
        let sub = runtime.create_subscriber(radar()).unwrap();
        sub.subscribe();

        let publisher = runtime.create_publisher(radar());
        for _ in 0..3 {
            publisher.publish(b"x");
        }
        assert_eq!(sub.queued_samples(), 2);
        assert_eq!(sub.dropped_samples(), 1);
    }
}
