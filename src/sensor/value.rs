// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named sensor readings decoded from packed group records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The decoded content of a sensor value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SensorReading {
    /// A scaled measurement, rounded to three decimals.
    Float(f64),
    /// An integer measurement.
    Int(i64),
    /// A textual reading.
    Text(String),
    /// A configurable alarm trip point.
    Alarm {
        /// Trip threshold in `unit`, rounded to three decimals.
        threshold: f64,
        /// Unit of the threshold.
        unit: String,
        /// Whether the alarm trips the switch.
        enabled: bool,
    },
}

/// A named reading owned by a sensor group.
///
/// Names are unique within a group. The `group` field names the owning group
/// for display and identification only.
///
/// # Examples
///
/// ```
/// use breaker_lib::sensor::SensorValue;
///
/// let voltage = SensorValue::float("phase_a", "voltage", 230.123_49);
/// assert_eq!(voltage.to_string(), "voltage=230.123");
///
/// let alarm = SensorValue::alarm("alarm_set_1", "leakage", 30.0, "mA", true);
/// assert_eq!(alarm.threshold(), Some(30.0));
/// assert_eq!(alarm.to_string(), "leakage threshold=30mA, switch_alarm=true");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorValue {
    name: String,
    group: String,
    reading: SensorReading,
}

impl SensorValue {
    /// Creates a value with an arbitrary reading.
    #[must_use]
    pub fn new(group: impl Into<String>, name: impl Into<String>, reading: SensorReading) -> Self {
        let reading = match reading {
            SensorReading::Float(v) => SensorReading::Float(round3(v)),
            SensorReading::Alarm {
                threshold,
                unit,
                enabled,
            } => SensorReading::Alarm {
                threshold: round3(threshold),
                unit,
                enabled,
            },
            other => other,
        };
        Self {
            name: name.into(),
            group: group.into(),
            reading,
        }
    }

    /// Creates a float reading.
    #[must_use]
    pub fn float(group: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self::new(group, name, SensorReading::Float(value))
    }

    /// Creates an integer reading.
    #[must_use]
    pub fn int(group: impl Into<String>, name: impl Into<String>, value: i64) -> Self {
        Self::new(group, name, SensorReading::Int(value))
    }

    /// Creates a text reading.
    #[must_use]
    pub fn text(group: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(group, name, SensorReading::Text(value.into()))
    }

    /// Creates an alarm threshold reading.
    #[must_use]
    pub fn alarm(
        group: impl Into<String>,
        name: impl Into<String>,
        threshold: f64,
        unit: impl Into<String>,
        enabled: bool,
    ) -> Self {
        Self::new(
            group,
            name,
            SensorReading::Alarm {
                threshold,
                unit: unit.into(),
                enabled,
            },
        )
    }

    /// Returns the reading name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the owning group.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the decoded reading.
    #[must_use]
    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    /// Returns the numeric value: the measurement, or the alarm threshold.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match &self.reading {
            SensorReading::Float(v) => Some(*v),
            SensorReading::Int(v) => Some(*v as f64),
            SensorReading::Alarm { threshold, .. } => Some(*threshold),
            SensorReading::Text(_) => None,
        }
    }

    /// Returns the alarm unit, if this is an alarm.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        match &self.reading {
            SensorReading::Alarm { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// Returns whether the alarm trips the switch, if this is an alarm.
    #[must_use]
    pub fn alarm_enabled(&self) -> Option<bool> {
        match &self.reading {
            SensorReading::Alarm { enabled, .. } => Some(*enabled),
            _ => None,
        }
    }

    /// Returns the alarm threshold, if this is an alarm.
    #[must_use]
    pub fn threshold(&self) -> Option<f64> {
        match &self.reading {
            SensorReading::Alarm { threshold, .. } => Some(*threshold),
            _ => None,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reading {
            SensorReading::Float(v) => write!(f, "{}={v:.3}", self.name),
            SensorReading::Int(v) => write!(f, "{}={v}", self.name),
            SensorReading::Text(v) => write!(f, "{}={v}", self.name),
            SensorReading::Alarm {
                threshold,
                unit,
                enabled,
            } => write!(
                f,
                "{} threshold={threshold:.0}{unit}, switch_alarm={enabled}",
                self.name
            ),
        }
    }
}

/// Merges an incoming reading into an existing one with the same name.
///
/// Returns whether the rendered form changed, together with the value to
/// store. The stored value always takes the incoming reading and keeps the
/// existing group.
#[must_use]
pub fn merge(existing: &SensorValue, incoming: SensorValue) -> (bool, SensorValue) {
    let changed = existing.to_string() != incoming.to_string();

    let merged = SensorValue {
        name: incoming.name,
        group: existing.group.clone(),
        reading: incoming.reading,
    };
    (changed, merged)
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
