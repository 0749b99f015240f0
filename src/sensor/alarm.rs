// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alarm threshold record decoding.
//!
//! An alarm record is a sequence of 4-byte entries:
//!
//! | Byte | Content |
//! |------|---------|
//! | 0    | alert-type code |
//! | 1    | `0x01` if the alarm trips the switch |
//! | 2..4 | big-endian u16 raw threshold |
//!
//! The meaning of the alert-type code depends on the group: each group owns
//! its own [`AlertType`] table.

use super::group::{GroupState, SensorGroup, SensorSet};
use super::value::SensorValue;
use crate::error::DecodeError;

/// Size of one alarm entry in bytes.
pub const ALARM_ENTRY_LEN: usize = 4;

/// Description of one alert-type code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertType {
    /// The code in byte 0 of the entry.
    pub code: u8,
    /// Name of the resulting reading.
    pub name: &'static str,
    /// Unit of the threshold.
    pub unit: &'static str,
    /// Divisor applied to the raw threshold.
    pub scale: f64,
}

/// Alerts reported on data point 17.
pub const LEAKAGE_ALERTS: &[AlertType] = &[
    AlertType {
        code: 0x04,
        name: "leakage",
        unit: "mA",
        scale: 1.0,
    },
    AlertType {
        code: 0x05,
        name: "high_temperature",
        unit: "°C",
        scale: 1.0,
    },
];

/// Alerts reported on data point 18.
pub const LINE_ALERTS: &[AlertType] = &[
    AlertType {
        code: 0x01,
        name: "over_current",
        unit: "A",
        scale: 10.0,
    },
    AlertType {
        code: 0x03,
        name: "over_voltage",
        unit: "V",
        scale: 1.0,
    },
    AlertType {
        code: 0x04,
        name: "under_voltage",
        unit: "V",
        scale: 1.0,
    },
];

/// Decodes a variable-length alarm threshold record.
///
/// # Examples
///
/// ```
/// use breaker_lib::sensor::{AlarmGroup, SensorGroup};
///
/// let mut group = AlarmGroup::alarm_set_1();
/// let changed = group.update(0, &[0x04, 0x01, 0x00, 0x0A]).unwrap();
///
/// assert_eq!(changed[0].name(), "leakage");
/// assert_eq!(changed[0].threshold(), Some(10.0));
/// assert_eq!(changed[0].unit(), Some("mA"));
/// assert_eq!(changed[0].alarm_enabled(), Some(true));
/// ```
#[derive(Debug, Clone)]
pub struct AlarmGroup {
    dp_id: String,
    name: String,
    alerts: &'static [AlertType],
    state: GroupState,
}

impl AlarmGroup {
    /// Creates an alarm group with its own alert table.
    #[must_use]
    pub fn new(
        dp_id: impl Into<String>,
        name: impl Into<String>,
        alerts: &'static [AlertType],
    ) -> Self {
        Self {
            dp_id: dp_id.into(),
            name: name.into(),
            alerts,
            state: GroupState::default(),
        }
    }

    /// Creates the leakage and temperature alarm group (data point 17).
    #[must_use]
    pub fn alarm_set_1() -> Self {
        Self::new("17", "alarm_set_1", LEAKAGE_ALERTS)
    }

    /// Creates the current and voltage alarm group (data point 18).
    #[must_use]
    pub fn alarm_set_2() -> Self {
        Self::new("18", "alarm_set_2", LINE_ALERTS)
    }

    /// Returns the alert table of this group.
    #[must_use]
    pub fn alerts(&self) -> &'static [AlertType] {
        self.alerts
    }

    fn decode_entry(&self, entry: &[u8]) -> Result<SensorValue, DecodeError> {
        let code = entry[0];
        let alert = self
            .alerts
            .iter()
            .find(|a| a.code == code)
            .ok_or_else(|| DecodeError::UnknownAlertType {
                group: self.name.clone(),
                code,
            })?;

        let enabled = entry[1] == 0x01;
        let raw = u16::from_be_bytes([entry[2], entry[3]]);
        let threshold = f64::from(raw) / alert.scale;

        Ok(SensorValue::alarm(
            &self.name, alert.name, threshold, alert.unit, enabled,
        ))
    }
}

impl SensorGroup for AlarmGroup {
    fn dp_id(&self) -> &str {
        &self.dp_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stride(&self) -> usize {
        ALARM_ENTRY_LEN
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<SensorValue>, DecodeError> {
        GroupState::check_stride(&self.name, ALARM_ENTRY_LEN, data)?;

        let decoded = data
            .chunks_exact(ALARM_ENTRY_LEN)
            .map(|entry| self.decode_entry(entry))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(group = %self.name, entries = decoded.len(), "Decoded alarm record");
        Ok(decoded)
    }

    fn commit(
        &mut self,
        timestamp: i64,
        data: &[u8],
        decoded: Vec<SensorValue>,
    ) -> Vec<SensorValue> {
        self.state.commit(timestamp, data, decoded)
    }

    fn sensors(&self) -> &SensorSet {
        &self.state.sensors
    }

    fn timestamp(&self) -> Option<i64> {
        self.state.timestamp
    }

    fn last_state(&self) -> &[u8] {
        &self.state.last_state
    }
}
