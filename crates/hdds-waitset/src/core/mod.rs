// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime primitives shared by the WaitSet and its sources.

pub mod channel;

pub use channel::{ChannelSignal, NotificationChannel};
