// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide cancellation trigger for Ctrl-C and similar interrupt paths.
//!
//! ```no_run
//! use hdds_waitset::{shutdown, Triggerable, TriggerBinding, UserTriggerEvent, WaitSet};
//!
//! let waitset = WaitSet::<4>::new();
//! let stop = shutdown::shutdown_trigger();
//! stop.attach_to(&waitset, UserTriggerEvent::Triggered, TriggerBinding::default())?;
//! // install the interrupt handler only after attaching:
//! // ctrlc::set_handler(shutdown::request_shutdown)
//!
//! loop {
//!     let ready = waitset.wait();
//!     if ready.iter().any(|t| t.does_originate_from(&stop)) {
//!         break;
//!     }
//! }
//! # Ok::<(), hdds_waitset::Error>(())
//! ```

use crate::user_trigger::UserTrigger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

static SHUTDOWN_TRIGGER: OnceLock<UserTrigger> = OnceLock::new();
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// The process-wide cancellation trigger.
///
/// The first call allocates it; call this during setup, never first from an
/// interrupt handler.
pub fn shutdown_trigger() -> UserTrigger {
    SHUTDOWN_TRIGGER.get_or_init(UserTrigger::new).clone()
}

/// Record a shutdown request and trigger the cancellation trigger.
///
/// Meant for interrupt paths such as the `ctrlc` handler thread: it performs
/// atomic stores, a lock-free attachment read and a non-blocking notify.
pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::Release);
    if let Some(trigger) = SHUTDOWN_TRIGGER.get() {
        trigger.trigger_from_interrupt();
    }
}

/// Whether [`request_shutdown`] has been called.
pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Acquire)
}
