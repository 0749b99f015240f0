// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Electrical phase record decoding.
//!
//! A phase record is 8 bytes, all big-endian:
//!
//! | Bytes | Width | Reading | Default divisor |
//! |-------|-------|---------|-----------------|
//! | 0..2  | u16   | `voltage` (V) | 10 |
//! | 2..5  | u24   | `current_a` (A) | 1000 |
//! | 5..8  | u24   | `power_kw` (kW) | 1000 |
//!
//! The divisors have not been confirmed against device documentation, so
//! they are configurable through [`PhaseScale`].

use serde::{Deserialize, Serialize};

use super::group::{GroupState, SensorGroup, SensorSet};
use super::value::SensorValue;
use crate::error::DecodeError;

/// Size of one phase record in bytes.
pub const PHASE_RECORD_LEN: usize = 8;

/// Name of the voltage reading.
pub const VOLTAGE: &str = "voltage";
/// Name of the current reading.
pub const CURRENT: &str = "current_a";
/// Name of the active power reading.
pub const POWER: &str = "power_kw";

/// Divisors applied to the raw phase readings.
///
/// The defaults are unverified guesses at the device's fixed-point format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseScale {
    /// Divisor for the raw voltage.
    pub voltage: f64,
    /// Divisor for the raw current.
    pub current: f64,
    /// Divisor for the raw power.
    pub power: f64,
}

impl Default for PhaseScale {
    fn default() -> Self {
        Self {
            voltage: 10.0,
            current: 1000.0,
            power: 1000.0,
        }
    }
}

/// Decodes the multi-phase electrical record.
///
/// # Examples
///
/// ```
/// use breaker_lib::sensor::{PhaseGroup, PhaseScale, SensorGroup};
///
/// let mut group = PhaseGroup::phase_a(PhaseScale::default());
///
/// // 230.0 V, 1.5 A, 0.345 kW
/// let record = [0x08, 0xFC, 0x00, 0x05, 0xDC, 0x00, 0x01, 0x59];
/// let changed = group.update(1_700_000_000, &record).unwrap();
///
/// assert_eq!(changed.len(), 3);
/// assert_eq!(group.sensors().get("voltage").unwrap().as_f64(), Some(230.0));
/// ```
#[derive(Debug, Clone)]
pub struct PhaseGroup {
    dp_id: String,
    name: String,
    scale: PhaseScale,
    state: GroupState,
}

impl PhaseGroup {
    /// Creates a phase group for the given data point.
    #[must_use]
    pub fn new(dp_id: impl Into<String>, name: impl Into<String>, scale: PhaseScale) -> Self {
        Self {
            dp_id: dp_id.into(),
            name: name.into(),
            scale,
            state: GroupState::default(),
        }
    }

    /// Creates the breaker's phase A group (data point 6).
    #[must_use]
    pub fn phase_a(scale: PhaseScale) -> Self {
        Self::new("6", "phase_a", scale)
    }

    /// Returns the divisors in use.
    #[must_use]
    pub fn scale(&self) -> PhaseScale {
        self.scale
    }

    fn decode_record(&self, record: &[u8]) -> Vec<SensorValue> {
        let voltage = u16::from_be_bytes([record[0], record[1]]);
        let current = u24_be(&record[2..5]);
        let power = u24_be(&record[5..8]);

        vec![
            SensorValue::float(&self.name, VOLTAGE, f64::from(voltage) / self.scale.voltage),
            SensorValue::float(&self.name, CURRENT, f64::from(current) / self.scale.current),
            SensorValue::float(&self.name, POWER, f64::from(power) / self.scale.power),
        ]
    }
}

impl SensorGroup for PhaseGroup {
    fn dp_id(&self) -> &str {
        &self.dp_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stride(&self) -> usize {
        PHASE_RECORD_LEN
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<SensorValue>, DecodeError> {
        GroupState::check_stride(&self.name, PHASE_RECORD_LEN, data)?;

        let mut records = data.chunks_exact(PHASE_RECORD_LEN);
        let decoded = records
            .next()
            .map(|record| self.decode_record(record))
            .unwrap_or_default();

        let extra = records.len();
        if extra > 0 {
            tracing::debug!(group = %self.name, extra, "Ignoring trailing phase records");
        }
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

fn u24_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}
