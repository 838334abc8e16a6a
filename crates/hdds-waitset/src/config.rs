// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global configuration - constants and runtime settings.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time limits (id string length, queue bounds)
//! - **Level 2 (Dynamic)**: [`RuntimeConfig`] and [`WaitSetConfig`], whose
//!   `Default` impls read `HDDS_WAITSET_*` environment variables
//!
//! # Example
//!
//! ```
//! use hdds_waitset::config::{RuntimeConfig, WaitSetConfig};
//! use std::time::Duration;
//!
//! let runtime = RuntimeConfig::new("/radar-gateway").with_subscriber_queue_capacity(64);
//! assert!(runtime.validate().is_ok());
//!
//! let waitset = WaitSetConfig::default().with_wake_recheck_interval(Duration::from_millis(20));
//! assert!(waitset.validate().is_ok());
//! ```

use crate::error::{Error, Result};
use std::time::Duration;

/// Trigger id meaning "ungrouped": the Trigger carries no grouping id.
pub const INVALID_TRIGGER_ID: u64 = u64::MAX;

/// Maximum length (bytes) of a runtime name or a service/instance/event string.
pub const MAX_ID_STRING_LEN: usize = 100;

/// Default depth of a subscriber's sample queue.
pub const DEFAULT_SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

/// Upper bound for a subscriber's sample queue depth.
pub const MAX_SUBSCRIBER_QUEUE_CAPACITY: usize = 4096;

/// Default upper bound on how long a blocked waiter sleeps before it
/// re-checks the pending notification flag.
pub const DEFAULT_WAKE_RECHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Smallest accepted wake re-check interval.
pub const MIN_WAKE_RECHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Environment variable overriding [`RuntimeConfig::subscriber_queue_capacity`].
pub const ENV_QUEUE_CAPACITY: &str = "HDDS_WAITSET_QUEUE_CAPACITY";

/// Environment variable overriding [`WaitSetConfig::wake_recheck_interval`] (ms).
pub const ENV_RECHECK_MS: &str = "HDDS_WAITSET_RECHECK_MS";

/// Process-level settings handed to [`crate::Runtime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Name identifying this process (e.g. `/radar-gateway`).
    pub app_name: String,

    /// Queue depth given to subscribers created without explicit options.
    pub subscriber_queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            app_name: "hdds-waitset".to_string(),
            subscriber_queue_capacity: std::env::var(ENV_QUEUE_CAPACITY)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SUBSCRIBER_QUEUE_CAPACITY),
        }
    }
}

impl RuntimeConfig {
    /// Create a config for the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Set the default subscriber queue depth.
    #[must_use]
    pub fn with_subscriber_queue_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_queue_capacity = capacity;
        self
    }

    /// Check every field against the static limits.
    pub fn validate(&self) -> Result<()> {
        if self.app_name.is_empty() {
            return Err(Error::InvalidConfig("app_name must not be empty".into()));
        }
        if self.app_name.len() > MAX_ID_STRING_LEN {
            return Err(Error::InvalidConfig(format!(
                "app_name exceeds {} bytes",
                MAX_ID_STRING_LEN
            )));
        }
        validate_queue_capacity(self.subscriber_queue_capacity)
    }
}

/// Settings for a single [`crate::WaitSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSetConfig {
    /// Longest time a blocked waiter parks before re-checking for a pending
    /// notification. Bounds wake latency when an interrupt-path notify
    /// races the waiter going to sleep.
    pub wake_recheck_interval: Duration,
}

impl Default for WaitSetConfig {
    fn default() -> Self {
        Self {
            wake_recheck_interval: std::env::var(ENV_RECHECK_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .filter(|interval| *interval >= MIN_WAKE_RECHECK_INTERVAL)
                .unwrap_or(DEFAULT_WAKE_RECHECK_INTERVAL),
        }
    }
}

impl WaitSetConfig {
    /// Set the wake re-check interval.
    #[must_use]
    pub fn with_wake_recheck_interval(mut self, interval: Duration) -> Self {
        self.wake_recheck_interval = interval;
        self
    }

    /// Reject intervals below [`MIN_WAKE_RECHECK_INTERVAL`].
    pub fn validate(&self) -> Result<()> {
        if self.wake_recheck_interval < MIN_WAKE_RECHECK_INTERVAL {
            return Err(Error::InvalidConfig(format!(
                "wake_recheck_interval must be >= {:?}",
                MIN_WAKE_RECHECK_INTERVAL
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_queue_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 || capacity > MAX_SUBSCRIBER_QUEUE_CAPACITY {
        return Err(Error::InvalidConfig(format!(
            "subscriber queue capacity {} out of range (1..={})",
            capacity, MAX_SUBSCRIBER_QUEUE_CAPACITY
        )));
    }
    Ok(())
}
