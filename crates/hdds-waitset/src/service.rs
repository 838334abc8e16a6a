// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service description - the (service, instance, event) triple a publisher
//! offers and subscribers match on.

use crate::config::MAX_ID_STRING_LEN;
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Validated (service, instance, event) identifier, e.g. `Radar/FrontLeft/Counter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceDescription {
    service: Arc<str>,
    instance: Arc<str>,
    event: Arc<str>,
}

impl ServiceDescription {
    /// Build a description.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidServiceDescription`] if a part is empty, longer than
    /// [`MAX_ID_STRING_LEN`] bytes, or contains `/`.
    pub fn new(service: &str, instance: &str, event: &str) -> Result<Self> {
        Ok(Self {
            service: check_part("service", service)?,
            instance: check_part("instance", instance)?,
            event: check_part("event", event)?,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn event(&self) -> &str {
        &self.event
    }
}

fn check_part(what: &str, value: &str) -> Result<Arc<str>> {
    if value.is_empty() {
        return Err(Error::InvalidServiceDescription(format!(
            "{} must not be empty",
            what
        )));
    }
    if value.len() > MAX_ID_STRING_LEN {
        return Err(Error::InvalidServiceDescription(format!(
            "{} exceeds {} bytes",
            what, MAX_ID_STRING_LEN
        )));
    }
    if value.contains('/') {
        return Err(Error::InvalidServiceDescription(format!(
            "{} must not contain '/': {}",
            what, value
        )));
    }
    Ok(Arc::from(value))
}

impl fmt::Display for ServiceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.service, self.instance, self.event)
    }
}
