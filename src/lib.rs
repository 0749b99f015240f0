// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Breaker Lib - decode and track the state of Tuya smart circuit breakers.
//!
//! This library models the 63A 2P smart meter and energy protector: it
//! decodes the data-point payloads the device reports, keeps the present
//! state of the device, and builds the payloads needed to change it.
//!
//! Transport, encryption and packet framing are left to a
//! [`DeviceSession`](protocol::DeviceSession) implementation supplied by the
//! caller.
//!
//! # Supported Data
//!
//! - **Energy totals**: forward, charged and balance energy in kWh
//! - **Switch state**: main switch, prepayment switch, auto-reclosing settings
//! - **Phase readings**: voltage, current and power (packed record)
//! - **Alarm thresholds**: leakage, temperature, over/under voltage, over current
//!
//! # Quick Start
//!
//! ```
//! use breaker_lib::state::DeviceState;
//! use breaker_lib::types::DpsMessage;
//! use breaker_lib::BreakerConfig;
//!
//! # fn main() -> breaker_lib::Result<()> {
//! let mut state = DeviceState::new(BreakerConfig::default());
//!
//! let msg = DpsMessage::from_json(r#"{"dps":{"1":12345,"17":"BAEACg=="}}"#)?;
//! let update = state.apply(msg)?;
//!
//! assert_eq!(update.changed_fields, vec!["total_forward_energy"]);
//! assert_eq!(state.total_forward_energy(), Some(123.45));
//!
//! for sensor in &update.changed_sensors {
//!     println!("Sensor changed: {sensor}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The library reports through the `tracing` facade and never installs a
//! subscriber. Unknown field names, enum values outside their list and
//! undecodable values are logged at `warn` level and otherwise ignored.

pub mod command;
mod config;
mod device;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod sensor;
pub mod state;
pub mod types;

pub use config::BreakerConfig;
pub use device::BreakerDevice;
pub use error::{DecodeError, Error, ParseError, Result, SessionError};
pub use registry::{FieldKind, FieldSpec, Registry};
pub use sensor::{AlarmGroup, PhaseGroup, PhaseScale, SensorGroup, SensorReading, SensorValue};
pub use state::{DeviceState, Outbound, StateUpdate};
pub use types::{DpsMessage, FieldValue, Payload};
