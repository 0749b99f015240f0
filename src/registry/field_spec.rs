// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static scalar field descriptions.

use std::fmt;

use serde_json::Value;

use crate::types::FieldValue;

/// A user-supplied decode/encode pair for [`FieldKind::Custom`] fields.
///
/// Both directions return `None` when the value cannot be converted; the
/// caller logs the failure and skips the field.
pub trait FieldCodec: fmt::Debug + Sync {
    /// Converts a raw payload value to its decoded form.
    fn decode(&self, raw: &Value) -> Option<FieldValue>;

    /// Converts a decoded value back to its payload form.
    fn encode(&self, value: &FieldValue) -> Option<Value>;
}

/// How a field's raw payload value maps to its decoded value.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Truthy/falsy raw value to a boolean.
    Bool,
    /// Raw value to an integer, no scaling.
    Int,
    /// Fixed-point integer; decoded value is `raw / scale`.
    ScaledInt(u32),
    /// Value passed through; members outside the list only log a warning.
    Enum(&'static [&'static str]),
    /// Base64 string to raw bytes.
    RawBytesBase64,
    /// Decoded by a dedicated codec.
    Custom(&'static dyn FieldCodec),
}

/// Description of one scalar data point.
///
/// # Examples
///
/// ```
/// use breaker_lib::registry::{FieldKind, FieldSpec};
///
/// const ENERGY: FieldSpec = FieldSpec::new("1", "total_forward_energy", FieldKind::ScaledInt(100))
///     .with_alt_name("energy");
///
/// assert!(ENERGY.matches_name("energy"));
/// assert!(ENERGY.tracks_raw());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// The data-point ID.
    pub id: &'static str,
    /// The semantic field name.
    pub name: &'static str,
    /// An alternate name that resolves to the same field.
    pub alt_name: Option<&'static str>,
    /// The decode/encode rule.
    pub kind: FieldKind,
    /// When set, the field only resolves by name if the device's
    /// high-resolution flag has this value.
    pub high_resolution: Option<bool>,
}

impl FieldSpec {
    /// Creates a field with no alternate name and no resolution constraint.
    #[must_use]
    pub const fn new(id: &'static str, name: &'static str, kind: FieldKind) -> Self {
        Self {
            id,
            name,
            alt_name: None,
            kind,
            high_resolution: None,
        }
    }

    /// Sets the alternate name.
    #[must_use]
    pub const fn with_alt_name(mut self, alt: &'static str) -> Self {
        self.alt_name = Some(alt);
        self
    }

    /// Restricts name resolution to devices whose high-resolution flag equals `flag`.
    #[must_use]
    pub const fn high_resolution_only(mut self, flag: bool) -> Self {
        self.high_resolution = Some(flag);
        self
    }

    /// Returns `true` if `name` is the primary or alternate name.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.alt_name == Some(name)
    }

    /// Returns `true` if this field is selectable under the given resolution mode.
    #[must_use]
    pub fn allows_resolution(&self, high_resolution: bool) -> bool {
        self.high_resolution.is_none_or(|flag| flag == high_resolution)
    }

    /// Returns `true` if change detection compares the raw payload value.
    ///
    /// Every kind except `Enum` transforms the raw value, so the raw value is
    /// the comparison key for those.
    #[must_use]
    pub fn tracks_raw(&self) -> bool {
        !matches!(self.kind, FieldKind::Enum(_))
    }
}

/// Allowed values for `relay_power_on_status`: off, on, restore last state.
pub const RELAY_POWER_ON_STATES: &[&str] = &["0", "1", "2"];

/// Scalar data points reported by the 63A 2P smart meter and energy protector.
pub const BREAKER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("1", "total_forward_energy", FieldKind::ScaledInt(100)),
    FieldSpec::new("16", "switch", FieldKind::Bool),
    FieldSpec::new("11", "switch_prepayment", FieldKind::Bool),
    FieldSpec::new("14", "charge_energy", FieldKind::ScaledInt(100)),
    FieldSpec::new("13", "balance_energy", FieldKind::ScaledInt(100)),
    FieldSpec::new("103", "temp_current", FieldKind::Int),
    FieldSpec::new("104", "reclosing_enabled", FieldKind::Bool),
    FieldSpec::new("102", "reclosing_allowed_times", FieldKind::Int),
    FieldSpec::new("107", "reclose_recover", FieldKind::Int),
    FieldSpec::new(
        "134",
        "relay_power_on_status",
        FieldKind::Enum(RELAY_POWER_ON_STATES),
    ),
];
