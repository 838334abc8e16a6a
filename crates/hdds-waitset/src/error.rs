// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for waitset, runtime and data-path operations.
//!
//! Every failure is an explicit value. `wait()` never fails: an elapsed
//! timeout is reported as an empty result, not as an error.

use crate::triggerable::OriginId;
use thiserror::Error;

/// Errors returned by hdds-waitset operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Attach attempted while every slot of the WaitSet is in use.
    ///
    /// Existing attachments are left untouched.
    #[error("waitset capacity exceeded (max {capacity})")]
    CapacityExceeded {
        /// Compile-time capacity of the WaitSet.
        capacity: usize,
    },

    /// The (origin, event) pair is already registered with this WaitSet.
    #[error("origin {origin} is already attached for event '{event}'")]
    AlreadyAttached {
        /// Identity of the source.
        origin: OriginId,
        /// Name of the event selector.
        event: &'static str,
    },

    /// The source has no attachment slot for the requested event.
    #[error("source does not support event '{event}'")]
    UnknownEvent {
        /// Name of the event selector.
        event: &'static str,
    },

    /// `Runtime::init` was already called with a different name.
    #[error("runtime already initialized as '{0}'")]
    RuntimeAlreadyInitialized(String),

    /// `Runtime::get` was called before `Runtime::init`.
    #[error("runtime not initialized")]
    RuntimeNotInitialized,

    /// A service/instance/event string is empty, too long or contains `/`.
    #[error("invalid service description: {0}")]
    InvalidServiceDescription(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenient alias for results using the crate [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
