// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::config::RuntimeConfig;
use crate::runtime::Runtime;
use crate::service::ServiceDescription;
use crate::subscriber::{Subscriber, SubscriberEvent};
use crate::user_trigger::{UserTrigger, UserTriggerEvent};
use crate::waitset::WaitSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn attached(waitset: &WaitSet<4>, binding: TriggerBinding<UserTrigger>) -> (UserTrigger, Trigger) {
    let source = UserTrigger::new();
    source
        .attach_to(waitset, UserTriggerEvent::Triggered, binding)
        .expect("attach should succeed");
    let trigger = waitset
        .triggers()
        .iter()
        .find(|t| t.does_originate_from(&source))
        .cloned()
        .expect("attached trigger should be recorded");
    (source, trigger)
}

#[test]
fn test_default_binding_is_ungrouped() {
    let waitset = WaitSet::<4>::new();
    let (_source, trigger) = attached(&waitset, TriggerBinding::default());

    assert_eq!(trigger.trigger_id(), Trigger::INVALID_TRIGGER_ID);
    assert!(!trigger.is_grouped());
    assert!(!trigger.has_callback());
    assert_eq!(trigger.event_name(), "triggered");
    assert_eq!(trigger.waitset_id(), waitset.id());
}

#[test]
fn test_binding_from_id() {
    let waitset = WaitSet::<4>::new();
    let (_source, trigger) = attached(&waitset, 123u64.into());

    assert_eq!(trigger.trigger_id(), 123);
    assert!(trigger.is_grouped());
}

#[test]
fn test_typed_origin_recovery() {
    let waitset = WaitSet::<4>::new();
    let (source, trigger) = attached(&waitset, TriggerBinding::default());

    let recovered = trigger.origin::<UserTrigger>().expect("origin should be alive");
    assert_eq!(recovered.origin_id(), source.origin_id());
    assert!(trigger.origin::<Subscriber>().is_none());
}

#[test]
fn test_origin_gone_after_source_drop() {
    let waitset = WaitSet::<4>::new();
    let (source, trigger) = attached(&waitset, TriggerBinding::default());
    drop(source);

    assert!(trigger.origin::<UserTrigger>().is_none());
    assert!(!trigger.is_attached());
    assert!(waitset.is_empty());
}

#[test]
fn test_invoke_passes_typed_origin() {
    let waitset = WaitSet::<4>::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(AtomicUsize::new(0));

    let source = UserTrigger::new();
    let (calls_cb, seen_cb) = (Arc::clone(&calls), Arc::clone(&seen));
    source
        .attach_to(
            &waitset,
            UserTriggerEvent::Triggered,
            TriggerBinding::callback(move |origin: &UserTrigger| {
                calls_cb.fetch_add(1, Ordering::SeqCst);
                seen_cb.store(origin.origin_id().as_u64() as usize, Ordering::SeqCst);
            }),
        )
        .unwrap();

    source.trigger();
    let ready = waitset.timed_wait(Duration::from_secs(1));
    assert_eq!(ready.len(), 1);
    assert!(ready[0].has_callback());

    ready[0].invoke();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(seen.load(Ordering::SeqCst), source.origin_id().as_u64() as usize);
}

#[test]
fn test_invoke_without_callback_is_noop() {
    let waitset = WaitSet::<4>::new();
    let (_source, trigger) = attached(&waitset, TriggerBinding::id(7));
    trigger.invoke();
}

#[test]
fn test_callback_and_id_combined() {
    let waitset = WaitSet::<4>::new();
    let (_source, trigger) = attached(
        &waitset,
        TriggerBinding::id(9).with_callback(|origin: &UserTrigger| origin.reset_trigger()),
    );
    assert_eq!(trigger.trigger_id(), 9);
    assert!(trigger.has_callback());
}

#[test]
fn test_trigger_through_handle() {
    let waitset = WaitSet::<4>::new();
    let (source, trigger) = attached(&waitset, TriggerBinding::default());

    trigger.trigger();
    assert!(source.has_triggered());

    let ready = waitset.timed_wait(Duration::from_secs(1));
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0], trigger);
    assert!(!source.has_triggered());
}

#[test]
fn test_detach_through_handle_is_idempotent() {
    let waitset = WaitSet::<4>::new();
    let (source, trigger) = attached(&waitset, TriggerBinding::default());
    assert!(trigger.is_attached());

    trigger.detach();
    trigger.detach();

    assert!(!trigger.is_attached());
    assert!(!source.is_attached());
    assert!(waitset.is_empty());

    trigger.trigger();
    assert!(!source.has_triggered());
}

#[test]
fn test_stale_trigger_does_not_fire_new_attachment() {
    let first = WaitSet::<4>::new();
    let second = WaitSet::<4>::new();
    let (source, stale) = attached(&first, TriggerBinding::default());

    source
        .attach_to(&second, UserTriggerEvent::Triggered, TriggerBinding::default())
        .unwrap();
    assert!(!stale.is_attached());

    stale.trigger();
    assert!(!source.has_triggered());

    // Detaching through the stale handle leaves the new attachment alone.
    stale.detach();
    assert_eq!(second.len(), 1);
    assert!(source.is_attached());
}

#[test]
fn test_subscriber_trigger_recovers_subscriber() {
    let runtime = Runtime::new(RuntimeConfig::new("/trigger-test")).unwrap();
    let service = ServiceDescription::new("Radar", "FrontLeft", "Counter").unwrap();
    let subscriber = runtime.create_subscriber(service.clone()).unwrap();
    subscriber.subscribe();

    let waitset = WaitSet::<4>::new();
    subscriber
        .attach_to(&waitset, SubscriberEvent::HasNewSamples, TriggerBinding::id(42))
        .unwrap();

    runtime.create_publisher(service).publish(&[1, 2, 3, 4]);

    let ready = waitset.timed_wait(Duration::from_secs(1));
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].event_name(), "has_new_samples");
    assert!(ready[0].origin::<UserTrigger>().is_none());

    let recovered = ready[0].origin::<Subscriber>().expect("subscriber should be alive");
    let sample = recovered.take().expect("sample should be queued");
    assert_eq!(sample.payload(), &[1, 2, 3, 4]);
}

#[test]
fn test_debug_output() {
    let waitset = WaitSet::<4>::new();
    let (_source, trigger) = attached(&waitset, TriggerBinding::id(5));
    let text = format!("{:?}", trigger);
    assert!(text.contains("trigger_id: 5"));
    assert!(text.contains("triggered"));
}
