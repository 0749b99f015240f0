// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scalar data-point registry.
//!
//! A [`Registry`] is a static table of [`FieldSpec`] entries. It resolves a
//! data-point ID to its field for inbound decoding, and a semantic name to
//! its data point for outbound encoding.
//!
//! Name lookups honor the device's high-resolution flag and return the first
//! matching entry, so table order decides between duplicate alternate names.
//!
//! # Examples
//!
//! ```
//! use breaker_lib::registry::Registry;
//!
//! let registry = Registry::breaker();
//!
//! let spec = registry.by_id("1").unwrap();
//! assert_eq!(spec.name, "total_forward_energy");
//!
//! let spec = registry.by_name("switch", false).unwrap();
//! assert_eq!(spec.id, "16");
//!
//! assert!(registry.by_id("999").is_none());
//! ```

mod codec;
mod field_spec;

pub use codec::{decode, encode};
pub use field_spec::{BREAKER_FIELDS, FieldCodec, FieldKind, FieldSpec, RELAY_POWER_ON_STATES};

/// A static table of scalar field descriptions.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    fields: &'static [FieldSpec],
}

impl Registry {
    /// Creates a registry over the given table.
    #[must_use]
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    /// Returns the registry for the breaker's scalar data points.
    #[must_use]
    pub const fn breaker() -> Self {
        Self::new(BREAKER_FIELDS)
    }

    /// Looks up a field by data-point ID.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.id == id)
    }

    /// Looks up a field by primary or alternate name.
    ///
    /// Entries constrained to the other resolution mode are skipped.
    #[must_use]
    pub fn by_name(&self, name: &str, high_resolution: bool) -> Option<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|spec| spec.matches_name(name) && spec.allows_resolution(high_resolution))
    }

    /// Returns all entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static FieldSpec> + use<> {
        self.fields.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::breaker()
    }
}
