// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state management types.
//!
//! The [`DeviceState`] struct holds the present state of a breaker. Inbound
//! payloads are applied with [`DeviceState::apply`], which returns a
//! [`StateUpdate`] naming the fields and sensors that changed. Outbound
//! payloads are built from semantic field names and come back as an
//! [`Outbound`].
//!
//! # Examples
//!
//! ```
//! use breaker_lib::state::{DeviceState, Outbound};
//!
//! let mut state = DeviceState::default();
//!
//! let outbound = state.build_outbound_many([("switch", true)]).unwrap();
//! let Outbound::Ready(payload) = outbound else { unreachable!() };
//! assert_eq!(payload.get("16"), Some(&serde_json::Value::Bool(true)));
//! ```

mod device_state;
mod state_update;

pub use device_state::DeviceState;
pub use state_update::{Outbound, StateUpdate};
