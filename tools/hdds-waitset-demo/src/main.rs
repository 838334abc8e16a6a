// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! hdds-waitset-demo - WaitSet event loops over an in-process radar feed
//!
//! Two modes, each with four subscribers of `Radar/FrontLeft/Counter` and a
//! Ctrl-C shutdown trigger on a capacity-5 WaitSet:
//!
//! - `gateway`: every subscriber is dispatched through its bound callback.
//! - `grouping`: subscribers 0-1 (group 123) print the counter, subscribers
//!   2-3 (group 456) dismiss their data.

use clap::{Parser, Subcommand};
use colored::*;
use hdds_waitset::{
    shutdown, Runtime, ServiceDescription, Subscriber, SubscriberEvent, TriggerBinding,
    Triggerable, UserTriggerEvent, WaitSet,
};
use std::thread;
use std::time::Duration;

const NUMBER_OF_SUBSCRIBERS: usize = 4;
const FIRST_GROUP_ID: u64 = 123;
const SECOND_GROUP_ID: u64 = 456;

type DemoWaitSet = WaitSet<{ NUMBER_OF_SUBSCRIBERS + 1 }>;

/// WaitSet event loop demo
#[derive(Parser, Debug)]
#[command(name = "hdds-waitset-demo")]
#[command(version = "0.1.0")]
#[command(about = "Multiplex subscribers and a Ctrl-C trigger with one WaitSet")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Interval between published counter samples (ms)
    #[arg(short, long, default_value = "1000", global = true)]
    interval_ms: u64,

    /// Stop after this many event-loop iterations (0 = until Ctrl-C)
    #[arg(short = 'n', long, default_value = "0", global = true)]
    count: u64,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Dispatch every subscriber through its attach-time callback
    Gateway,
    /// Handle subscribers by trigger id: print group 123, dismiss group 456
    Grouping,
}

impl Mode {
    fn app_name(self) -> &'static str {
        match self {
            Mode::Gateway => "/hdds-waitset-gateway",
            Mode::Grouping => "/hdds-waitset-grouping",
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::init(args.mode.app_name())?;
    let service = ServiceDescription::new("Radar", "FrontLeft", "Counter")?;
    let waitset = DemoWaitSet::new();

    // Attach before installing the handler so the first Ctrl-C is not missed.
    let shutdown_trigger = shutdown::shutdown_trigger();
    shutdown_trigger.attach_to(&waitset, UserTriggerEvent::Triggered, TriggerBinding::default())?;
    ctrlc::set_handler(shutdown::request_shutdown)?;

    let mut subscribers = Vec::with_capacity(NUMBER_OF_SUBSCRIBERS);
    for index in 0..NUMBER_OF_SUBSCRIBERS {
        let subscriber = runtime.create_subscriber(service.clone())?;
        subscriber.subscribe();
        let binding = match args.mode {
            Mode::Gateway => TriggerBinding::callback(subscriber_callback),
            Mode::Grouping if index < NUMBER_OF_SUBSCRIBERS / 2 => TriggerBinding::id(FIRST_GROUP_ID),
            Mode::Grouping => TriggerBinding::id(SECOND_GROUP_ID),
        };
        subscriber.attach_to(&waitset, SubscriberEvent::HasNewSamples, binding)?;
        subscribers.push(subscriber);
    }

    eprintln!(
        "{} {} on {} ({} subscribers, Ctrl-C to stop)",
        "hdds-waitset-demo".bold(),
        format!("{:?}", args.mode).to_lowercase().cyan(),
        service.to_string().green(),
        subscribers.len()
    );

    let publisher = runtime.create_publisher(service);
    let interval = Duration::from_millis(args.interval_ms.max(1));
    let feeder = thread::Builder::new()
        .name("radar-feeder".into())
        .spawn(move || {
            let mut counter: u32 = 0;
            while !shutdown::shutdown_requested() {
                publisher.publish(&counter.to_le_bytes());
                counter = counter.wrapping_add(1);
                thread::sleep(interval);
            }
        })?;

    event_loop(&waitset, args.mode, args.count);

    // Stops the feeder when the loop ended on --count.
    shutdown::request_shutdown();
    if feeder.join().is_err() {
        log::warn!("[demo] feeder thread panicked");
    }
    Ok(())
}

fn event_loop(waitset: &DemoWaitSet, mode: Mode, max_iterations: u64) {
    let shutdown_trigger = shutdown::shutdown_trigger();
    let mut iterations = 0u64;

    loop {
        let triggers = waitset.wait();

        for trigger in &triggers {
            if trigger.does_originate_from(&shutdown_trigger) {
                // CTRL+C was pressed -> exit
                eprintln!("{}", "shutdown requested".yellow());
                return;
            }
            match mode {
                Mode::Gateway => trigger.invoke(),
                Mode::Grouping => handle_group(trigger),
            }
        }
        println!();

        iterations += 1;
        if max_iterations > 0 && iterations >= max_iterations {
            return;
        }
    }
}

fn subscriber_callback(subscriber: &Subscriber) {
    if let Some(sample) = subscriber.take() {
        println!(
            "subscriber: {} length: {} ptr: {:p}",
            subscriber.origin_id(),
            sample.header().payload_size,
            sample.payload_ptr()
        );
    }
}

fn handle_group(trigger: &hdds_waitset::Trigger) {
    let Some(subscriber) = trigger.origin::<Subscriber>() else {
        return;
    };
    match trigger.trigger_id() {
        FIRST_GROUP_ID => {
            if let Some(sample) = subscriber.take() {
                match <[u8; 4]>::try_from(sample.payload()) {
                    Ok(bytes) => println!("received: {}", u32::from_le_bytes(bytes)),
                    Err(_) => log::warn!(
                        "[demo] unexpected payload size {}",
                        sample.header().payload_size
                    ),
                }
            }
        }
        SECOND_GROUP_ID => {
            println!("dismiss data");
            // Releasing resets "has new samples"; otherwise the queued data
            // would stay pending.
            subscriber.release_queued_samples();
        }
        other => log::debug!("[demo] ignoring trigger id {}", other),
    }
}
