// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor groups decoded from packed binary data points.
//!
//! Some data points carry a base64 string holding several readings in a
//! fixed binary layout. Each such data point is handled by a
//! [`SensorGroup`], which keeps the decoded [`SensorValue`]s and reports
//! which of them changed on every update.
//!
//! # Groups
//!
//! - [`PhaseGroup`] - voltage, current and power of one phase (data point 6)
//! - [`AlarmGroup`] - alarm thresholds (data points 17 and 18)

mod alarm;
mod group;
mod phase;
mod value;

pub use alarm::{ALARM_ENTRY_LEN, AlarmGroup, AlertType, LEAKAGE_ALERTS, LINE_ALERTS};
pub use group::{SensorGroup, SensorSet};
pub use phase::{CURRENT, PHASE_RECORD_LEN, POWER, PhaseGroup, PhaseScale, VOLTAGE};
pub use value::{SensorReading, SensorValue, merge};
