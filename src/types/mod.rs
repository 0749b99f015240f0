// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types exchanged with a breaker device.
//!
//! # Types
//!
//! - [`FieldValue`] - A decoded scalar data-point value
//! - [`Payload`] - Data-point ID to raw JSON value map
//! - [`DpsMessage`] - Inbound envelope holding a payload and its event time

mod field_value;
mod payload;

pub use field_value::FieldValue;
pub use payload::{DpsMessage, Payload};
