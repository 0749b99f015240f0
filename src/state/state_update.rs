// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Results of applying and building payloads.

use serde::Serialize;

use crate::sensor::SensorValue;
use crate::types::Payload;

/// The outcome of applying an inbound payload to a [`DeviceState`](super::DeviceState).
///
/// Carries the original payload together with what changed. Applying the
/// same payload again yields an update with no changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateUpdate {
    /// The payload as received, unknown data points included.
    pub dps: Payload,
    /// Event time used for the sensor group updates.
    pub timestamp: i64,
    /// Names of scalar fields whose value changed, alternate names included.
    pub changed_fields: Vec<&'static str>,
    /// Sensor readings that are new or changed.
    pub changed_sensors: Vec<SensorValue>,
}

impl StateUpdate {
    /// Returns `true` if any field or sensor changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed_fields.is_empty() || !self.changed_sensors.is_empty()
    }

    /// Returns `true` if the named field is among the changed fields.
    #[must_use]
    pub fn field_changed(&self, name: &str) -> bool {
        self.changed_fields.contains(&name)
    }
}

/// The outcome of building an outbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// The payload is ready to be sent.
    Ready(Payload),
    /// The values were merged into the pending buffer.
    Queued {
        /// Number of data points now waiting in the buffer.
        pending: usize,
    },
}

impl Outbound {
    /// Returns the ready payload, if any.
    #[must_use]
    pub fn into_payload(self) -> Option<Payload> {
        match self {
            Self::Ready(payload) => Some(payload),
            Self::Queued { .. } => None,
        }
    }
}
