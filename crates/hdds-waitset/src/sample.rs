// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample - reference-counted payload handed from a publisher to every
//! matching subscriber without copying.

use std::fmt;
use std::sync::Arc;

/// Metadata delivered with every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleHeader {
    /// Payload length in bytes.
    pub payload_size: usize,
    /// Per-publisher sequence number, starting at 1.
    pub sequence_number: u64,
    /// Identifier of the publishing [`Publisher`](crate::Publisher).
    pub publisher_id: u64,
}

/// Immutable sample shared by all receivers of one `publish()`.
#[derive(Clone)]
pub struct Sample {
    header: SampleHeader,
    payload: Arc<[u8]>,
}

impl Sample {
    pub(crate) fn new(header: SampleHeader, payload: Arc<[u8]>) -> Self {
        Self { header, payload }
    }

    #[inline]
    pub fn header(&self) -> &SampleHeader {
        &self.header
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Address of the shared payload; identical for every receiver of the
    /// same publish.
    #[inline]
    pub fn payload_ptr(&self) -> *const u8 {
        self.payload.as_ptr()
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("header", &self.header)
            .field("payload_ptr", &self.payload_ptr())
            .finish()
    }
}
