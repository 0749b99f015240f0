// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor group capability and shared bookkeeping.

use std::fmt;

use super::value::{SensorValue, merge};
use crate::error::DecodeError;

/// A data point whose value is a packed binary record of several readings.
///
/// Implementations reject a record whose length is not a multiple of
/// [`stride`](Self::stride) and leave their entries untouched on any error.
/// An empty record clears the group.
pub trait SensorGroup: fmt::Debug {
    /// Returns the data-point ID this group decodes.
    fn dp_id(&self) -> &str;

    /// Returns the group name.
    fn name(&self) -> &str;

    /// Returns the size of one record entry in bytes.
    fn stride(&self) -> usize;

    /// Decodes a record without storing it.
    ///
    /// An empty record decodes to no readings.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the record is malformed.
    fn decode(&self, data: &[u8]) -> Result<Vec<SensorValue>, DecodeError>;

    /// Stores a record decoded by [`decode`](Self::decode) and returns the
    /// readings that are new or changed.
    fn commit(&mut self, timestamp: i64, data: &[u8], decoded: Vec<SensorValue>)
    -> Vec<SensorValue>;

    /// Decodes a record and returns the readings that are new or changed.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the record is malformed. The group keeps its
    /// previous entries in that case.
    fn update(&mut self, timestamp: i64, data: &[u8]) -> Result<Vec<SensorValue>, DecodeError> {
        let decoded = self.decode(data)?;
        Ok(self.commit(timestamp, data, decoded))
    }

    /// Returns the current readings.
    fn sensors(&self) -> &SensorSet;

    /// Returns the event time of the last accepted record.
    fn timestamp(&self) -> Option<i64>;

    /// Returns the bytes of the last accepted record.
    fn last_state(&self) -> &[u8];
}

/// Ordered readings of one group, unique by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSet {
    values: Vec<SensorValue>,
}

impl SensorSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a reading, or merges it into the entry with the same name.
    ///
    /// Returns the stored value if it is new or changed.
    pub fn insert_or_update(&mut self, incoming: SensorValue) -> Option<SensorValue> {
        if let Some(slot) = self.values.iter_mut().find(|v| v.name() == incoming.name()) {
            let (changed, merged) = merge(slot, incoming);
            *slot = merged;
            return changed.then(|| slot.clone());
        }

        self.values.push(incoming.clone());
        Some(incoming)
    }

    /// Returns the reading with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SensorValue> {
        self.values.iter().find(|v| v.name() == name)
    }

    /// Iterates over the readings in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, SensorValue> {
        self.values.iter()
    }

    /// Returns the number of readings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no readings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes all readings.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<'a> IntoIterator for &'a SensorSet {
    type Item = &'a SensorValue;
    type IntoIter = std::slice::Iter<'a, SensorValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// State shared by every group implementation.
#[derive(Debug, Clone, Default)]
pub(crate) struct GroupState {
    pub(crate) sensors: SensorSet,
    pub(crate) timestamp: Option<i64>,
    pub(crate) last_state: Vec<u8>,
}

impl GroupState {
    /// Validates the record length against the stride.
    pub(crate) fn check_stride(group: &str, stride: usize, data: &[u8]) -> Result<(), DecodeError> {
        if data.len() % stride == 0 {
            Ok(())
        } else {
            Err(DecodeError::InvalidLength {
                group: group.to_string(),
                stride,
                actual: data.len(),
            })
        }
    }

    /// Stores a fully decoded record and returns the changed readings.
    ///
    /// An empty record clears the readings.
    pub(crate) fn commit(
        &mut self,
        timestamp: i64,
        data: &[u8],
        decoded: Vec<SensorValue>,
    ) -> Vec<SensorValue> {
        self.timestamp = Some(timestamp);
        if data.is_empty() {
            self.sensors.clear();
            self.last_state.clear();
            return Vec::new();
        }
        self.last_state = data.to_vec();
        decoded
            .into_iter()
            .filter_map(|v| self.sensors.insert_or_update(v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_update_in_place() {
        let mut set = SensorSet::new();
        assert!(set.insert_or_update(SensorValue::float("g", "a", 1.0)).is_some());
        assert!(set.insert_or_update(SensorValue::float("g", "b", 2.0)).is_some());

        let changed = set.insert_or_update(SensorValue::float("g", "a", 3.0));
        assert_eq!(changed.unwrap().as_f64(), Some(3.0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next().unwrap().name(), "a");
    }

    #[test]
    fn unchanged_value_is_not_reported() {
        let mut set = SensorSet::new();
        set.insert_or_update(SensorValue::int("g", "a", 1));
        assert!(set.insert_or_update(SensorValue::int("g", "a", 1)).is_none());
    }

    #[test]
    fn stride_check() {
        assert!(GroupState::check_stride("g", 4, &[0; 8]).is_ok());
        assert!(GroupState::check_stride("g", 4, &[]).is_ok());
        let err = GroupState::check_stride("g", 4, &[0; 6]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidLength {
                stride: 4,
                actual: 6,
                ..
            }
        ));
    }
}
