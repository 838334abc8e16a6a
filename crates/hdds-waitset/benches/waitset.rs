// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet Benchmark
//!
//! Measures the hot paths of the event loop:
//! - trigger + wait round trip on the consumer thread
//! - sweep cost for a full WaitSet with one ready source
//! - publish fan-out to attached subscribers
//! - attach/detach churn

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hdds_waitset::config::RuntimeConfig;
use hdds_waitset::{
    Runtime, ServiceDescription, SubscriberEvent, TriggerBinding, Triggerable, UserTrigger,
    UserTriggerEvent, WaitSet,
};
use std::time::Duration;

const EVENT: UserTriggerEvent = UserTriggerEvent::Triggered;

fn bench_trigger_wait_roundtrip(c: &mut Criterion) {
    let waitset = WaitSet::<1>::new();
    let trigger = UserTrigger::new();
    trigger
        .attach_to(&waitset, EVENT, TriggerBinding::default())
        .expect("attach");

    c.bench_function("trigger_wait_roundtrip", |b| {
        b.iter(|| {
            trigger.trigger();
            let ready = waitset.timed_wait(Duration::from_secs(1));
            black_box(ready.len())
        });
    });
}

fn sweep_full<const N: usize>(c: &mut Criterion) {
    let waitset = WaitSet::<N>::new();
    let sources: Vec<UserTrigger> = (0..N).map(|_| UserTrigger::new()).collect();
    for source in &sources {
        waitset
            .attach(source, EVENT, TriggerBinding::default())
            .expect("attach");
    }
    let last = &sources[N - 1];

    c.bench_with_input(BenchmarkId::new("sweep_one_ready", N), &N, |b, _| {
        b.iter(|| {
            last.trigger();
            black_box(waitset.wait().len())
        });
    });
}

fn bench_sweep(c: &mut Criterion) {
    sweep_full::<4>(c);
    sweep_full::<16>(c);
    sweep_full::<64>(c);
}

fn bench_publish_fanout(c: &mut Criterion) {
    let runtime = Runtime::new(RuntimeConfig::new("/bench")).expect("runtime");
    let service = ServiceDescription::new("Radar", "FrontLeft", "Counter").expect("service");
    let waitset = WaitSet::<4>::new();
    let subscribers: Vec<_> = (0..4)
        .map(|_| {
            let subscriber = runtime.create_subscriber(service.clone()).expect("subscriber");
            subscriber.subscribe();
            subscriber
                .attach_to(&waitset, SubscriberEvent::HasNewSamples, TriggerBinding::default())
                .expect("attach");
            subscriber
        })
        .collect();
    let publisher = runtime.create_publisher(service);
    let payload = [0u8; 64];

    c.bench_function("publish_fanout_4", |b| {
        b.iter(|| {
            black_box(publisher.publish(&payload));
            for trigger in &waitset.wait() {
                if let Some(subscriber) = trigger.origin::<hdds_waitset::Subscriber>() {
                    while let Some(sample) = subscriber.take() {
                        black_box(sample.payload_ptr());
                    }
                }
            }
        });
    });
    drop(subscribers);
}

fn bench_attach_detach(c: &mut Criterion) {
    let waitset = WaitSet::<8>::new();
    let source = UserTrigger::new();

    c.bench_function("attach_detach", |b| {
        b.iter(|| {
            waitset
                .attach(&source, EVENT, TriggerBinding::id(1))
                .expect("attach");
            black_box(waitset.detach(&source, EVENT))
        });
    });
}

criterion_group!(
    benches,
    bench_trigger_wait_roundtrip,
    bench_sweep,
    bench_publish_fanout,
    bench_attach_detach
);
criterion_main!(benches);
