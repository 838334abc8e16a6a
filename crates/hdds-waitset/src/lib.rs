// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-waitset - bounded event multiplexing for one consumer thread
//!
//! A [`WaitSet`] lets a single thread block on many heterogeneous event
//! sources (subscribers receiving samples, application-raised
//! [`UserTrigger`]s) and returns the [`Trigger`]s of the ones that became
//! ready. Capacity is fixed at compile time; neither the ready sweep nor the
//! returned result allocates.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdds_waitset::{
//!     Runtime, ServiceDescription, SubscriberEvent, TriggerBinding, Triggerable, UserTrigger,
//!     UserTriggerEvent, WaitSet,
//! };
//! use hdds_waitset::config::RuntimeConfig;
//!
//! fn main() -> hdds_waitset::Result<()> {
//!     let runtime = Runtime::new(RuntimeConfig::new("/quick-start"))?;
//!     let service = ServiceDescription::new("Radar", "FrontLeft", "Counter")?;
//!
//!     let waitset = WaitSet::<2>::new();
//!     let stop = UserTrigger::new();
//!     stop.attach_to(&waitset, UserTriggerEvent::Triggered, TriggerBinding::default())?;
//!
//!     let subscriber = runtime.create_subscriber(service.clone())?;
//!     subscriber.subscribe();
//!     subscriber.attach_to(&waitset, SubscriberEvent::HasNewSamples, TriggerBinding::id(1))?;
//!
//!     runtime.create_publisher(service).publish(&42u32.to_le_bytes());
//!
//!     for trigger in waitset.wait() {
//!         if trigger.does_originate_from(&stop) {
//!             return Ok(());
//!         }
//!         if let Some(subscriber) = trigger.origin::<hdds_waitset::Subscriber>() {
//!             while let Some(sample) = subscriber.take() {
//!                 assert_eq!(sample.header().payload_size, 4);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |  Sources: Subscriber, UserTrigger  (Triggerable)            |
//! |     ready flag + AttachmentCell --notify()--+               |
//! +---------------------------------------------|---------------+
//! |  WaitSet<N>                                 v               |
//! |     NotificationChannel { Mutex<slots>, Condvar, pending }  |
//! |     wait() -> heapless::Vec<Trigger, N>                     |
//! +-------------------------------------------------------------+
//! |  Data path: Runtime -> Publisher -> Sample -> Subscriber    |
//! +-------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`waitset`] - the multiplexer (start here)
//! - [`trigger`] - registration handle returned by `wait()`
//! - [`triggerable`] - contract every attachable source satisfies
//! - [`subscriber`], [`user_trigger`] - concrete sources
//! - [`runtime`], [`publisher`], [`sample`], [`service`] - in-process data path
//! - [`shutdown`] - process-wide cancellation for Ctrl-C handlers

/// Global configuration (limits, runtime and waitset settings).
pub mod config;
/// Notification channel shared by a WaitSet and its sources.
pub mod core;
/// Error type and `Result` alias.
pub mod error;
/// Send side of the in-process data path.
pub mod publisher;
/// Process identity and service registry.
pub mod runtime;
/// Reference-counted samples.
pub mod sample;
/// Service descriptions.
pub mod service;
/// Process-wide cancellation trigger.
pub mod shutdown;
/// Subscriber source.
pub mod subscriber;
/// Trigger registration handle.
pub mod trigger;
/// Triggerable capability.
pub mod triggerable;
/// Application-controlled source.
pub mod user_trigger;
/// Fixed-capacity WaitSet.
pub mod waitset;

pub use config::{RuntimeConfig, WaitSetConfig, INVALID_TRIGGER_ID};
pub use error::{Error, Result};
pub use publisher::Publisher;
pub use runtime::Runtime;
pub use sample::{Sample, SampleHeader};
pub use service::ServiceDescription;
pub use subscriber::{SubscribeState, Subscriber, SubscriberEvent, SubscriberOptions};
pub use trigger::{Trigger, TriggerBinding};
pub use triggerable::{AttachmentCell, OriginId, TriggerEvent, TriggerOrigin, Triggerable};
pub use user_trigger::{UserTrigger, UserTriggerEvent};
pub use waitset::{TriggerVec, WaitSet};
