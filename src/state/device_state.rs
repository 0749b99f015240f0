// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::{Outbound, StateUpdate};
use crate::config::BreakerConfig;
use crate::error::DecodeError;
use crate::registry::{self, FieldSpec, Registry};
use crate::sensor::{AlarmGroup, PhaseGroup, SensorGroup, SensorValue};
use crate::types::{DpsMessage, FieldValue, Payload};

/// Tracked state of one breaker.
///
/// Holds the decoded scalar fields, the raw values used for change
/// detection, and the sensor groups. All fields start unknown until the
/// device reports them.
///
/// The state does no locking; callers sharing it across threads must
/// serialize access.
///
/// # Examples
///
/// ```
/// use breaker_lib::state::DeviceState;
/// use breaker_lib::types::{DpsMessage, Payload};
/// use breaker_lib::BreakerConfig;
///
/// let mut state = DeviceState::new(BreakerConfig::default());
///
/// let mut dps = Payload::new();
/// dps.insert("1".into(), 12345.into());
///
/// let update = state.apply(DpsMessage::new(dps.clone())).unwrap();
/// assert_eq!(update.changed_fields, vec!["total_forward_energy"]);
/// assert_eq!(state.total_forward_energy(), Some(123.45));
///
/// // Same payload again: nothing changed
/// let update = state.apply(DpsMessage::new(dps)).unwrap();
/// assert!(!update.has_changes());
/// ```
#[derive(Debug)]
pub struct DeviceState {
    registry: Registry,
    config: BreakerConfig,
    /// Decoded values keyed by data-point ID.
    values: HashMap<&'static str, FieldValue>,
    /// Last raw values of fields compared by raw value, keyed by data-point ID.
    raw: HashMap<&'static str, Value>,
    groups: Vec<Box<dyn SensorGroup>>,
    pending: Payload,
}

impl DeviceState {
    /// Creates the state of a breaker with its standard fields and groups.
    #[must_use]
    pub fn new(config: BreakerConfig) -> Self {
        let groups: Vec<Box<dyn SensorGroup>> = vec![
            Box::new(PhaseGroup::phase_a(config.phase_scale)),
            Box::new(AlarmGroup::alarm_set_1()),
            Box::new(AlarmGroup::alarm_set_2()),
        ];
        Self::with_parts(config, Registry::breaker(), groups)
    }

    /// Creates a state over a custom field table and group list.
    #[must_use]
    pub fn with_parts(
        config: BreakerConfig,
        registry: Registry,
        groups: Vec<Box<dyn SensorGroup>>,
    ) -> Self {
        Self {
            registry,
            config,
            values: HashMap::new(),
            raw: HashMap::new(),
            groups,
            pending: Payload::new(),
        }
    }

    /// Returns the configuration this state was built with.
    #[must_use]
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Returns the field registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ========== Inbound ==========

    /// Applies an inbound payload and reports what changed.
    ///
    /// Sensor group data points are decoded first, then scalar fields.
    /// Data points that match neither are left in the returned payload
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if a sensor group record is malformed. Every
    /// group record is decoded before any is stored, so nothing is applied
    /// in that case.
    pub fn apply(&mut self, message: DpsMessage) -> Result<StateUpdate, DecodeError> {
        let timestamp = message.timestamp();
        let mut update = StateUpdate {
            timestamp,
            ..StateUpdate::default()
        };

        let mut records = Vec::new();
        for (index, group) in self.groups.iter().enumerate() {
            let Some(raw) = message.dps.get(group.dp_id()) else {
                continue;
            };
            let bytes = group_bytes(group.dp_id(), raw)?;
            let decoded = group.decode(&bytes)?;
            records.push((index, bytes, decoded));
        }

        for (index, bytes, decoded) in records {
            let group = &mut self.groups[index];
            let changed = group.commit(timestamp, &bytes, decoded);
            tracing::debug!(
                group = group.name(),
                changed = changed.len(),
                "Updated sensor group"
            );
            update.changed_sensors.extend(changed);
        }

        for (id, raw) in &message.dps {
            if self.is_group(id) {
                continue;
            }
            match self.registry.by_id(id) {
                Some(spec) => self.apply_field(spec, raw, &mut update.changed_fields),
                None => tracing::trace!(dp = %id, "Ignoring unknown data point"),
            }
        }

        update.dps = message.dps;
        Ok(update)
    }

    fn apply_field(
        &mut self,
        spec: &'static FieldSpec,
        raw: &Value,
        changed: &mut Vec<&'static str>,
    ) {
        if spec.tracks_raw() && self.raw.get(spec.id) == Some(raw) {
            return;
        }

        let Some(value) = registry::decode(spec, raw) else {
            return;
        };

        if !spec.tracks_raw() && self.values.get(spec.id) == Some(&value) {
            return;
        }

        changed.push(spec.name);
        if let Some(alt) = spec.alt_name {
            changed.push(alt);
        }

        if spec.tracks_raw() {
            self.raw.insert(spec.id, raw.clone());
        }
        self.values.insert(spec.id, value);
    }

    fn is_group(&self, id: &str) -> bool {
        self.groups.iter().any(|g| g.dp_id() == id)
    }

    // ========== Scalar Fields ==========

    /// Gets a field value by primary or alternate name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        let spec = self.registry.by_name(name, self.config.high_resolution)?;
        self.values.get(spec.id)
    }

    /// Gets the last raw value of a field compared by raw value.
    #[must_use]
    pub fn raw_value(&self, name: &str) -> Option<&Value> {
        let spec = self.registry.by_name(name, self.config.high_resolution)?;
        self.raw.get(spec.id)
    }

    /// Gets the total forward energy in kWh.
    #[must_use]
    pub fn total_forward_energy(&self) -> Option<f64> {
        self.value("total_forward_energy").and_then(FieldValue::as_f64)
    }

    /// Gets the switch state (`true` when closed).
    #[must_use]
    pub fn switch(&self) -> Option<bool> {
        self.value("switch").and_then(FieldValue::as_bool)
    }

    /// Gets the internal temperature in degrees Celsius.
    #[must_use]
    pub fn temperature(&self) -> Option<i64> {
        self.value("temp_current").and_then(FieldValue::as_i64)
    }

    /// Iterates over every field as `(name, value)` pairs in table order.
    ///
    /// A field with an alternate name is yielded twice, alternate name first.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Option<&FieldValue>)> + '_ {
        self.registry.iter().flat_map(move |spec| {
            let value = self.values.get(spec.id);
            spec.alt_name
                .map(|alt| (alt, value))
                .into_iter()
                .chain(std::iter::once((spec.name, value)))
        })
    }

    // ========== Sensor Groups ==========

    /// Iterates over the sensor groups in order.
    pub fn groups(&self) -> impl Iterator<Item = &dyn SensorGroup> + '_ {
        self.groups
            .iter()
            .map(|g| -> &dyn SensorGroup { g.as_ref() })
    }

    /// Gets a sensor group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&dyn SensorGroup> {
        self.groups().find(|g| g.name() == name)
    }

    /// Iterates over all sensor readings, group by group.
    pub fn sensors(&self) -> impl Iterator<Item = &SensorValue> + '_ {
        self.groups.iter().flat_map(|g| g.sensors().iter())
    }

    /// Finds the first sensor reading with the given name across all groups.
    #[must_use]
    pub fn find_sensor(&self, name: &str) -> Option<&SensorValue> {
        self.sensors().find(|s| s.name() == name)
    }

    /// Gets a sensor reading by position in [`sensors`](Self::sensors) order.
    #[must_use]
    pub fn sensor_at(&self, index: usize) -> Option<&SensorValue> {
        self.sensors().nth(index)
    }

    /// Returns the total number of sensor readings.
    #[must_use]
    pub fn sensor_count(&self) -> usize {
        self.groups.iter().map(|g| g.sensors().len()).sum()
    }

    // ========== Outbound ==========

    /// Encodes one field for transmission.
    ///
    /// Returns `(data_point_id, encoded_value)`, or `None` with a warning if
    /// the name does not resolve or the value does not fit the field.
    pub fn build_outbound(
        &self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Option<(&'static str, Value)> {
        let Some(spec) = self.registry.by_name(name, self.config.high_resolution) else {
            tracing::warn!(field = name, "Requested field not found");
            return None;
        };
        let encoded = registry::encode(spec, &value.into())?;
        Some((spec.id, encoded))
    }

    /// Encodes one field and sends it through the configured outbound mode.
    ///
    /// Returns `None` without touching the pending buffer if the field
    /// cannot be encoded.
    pub fn stage(&mut self, name: &str, value: impl Into<FieldValue>) -> Option<Outbound> {
        let (id, encoded) = self.build_outbound(name, value)?;
        let mut payload = Payload::new();
        payload.insert(id.to_string(), encoded);
        Some(self.dispatch(payload))
    }

    /// Encodes several fields into one payload.
    ///
    /// Either every entry is encoded or none is: if any name fails to
    /// resolve or encode, `None` is returned and the pending buffer is left
    /// as it was. With `delay_updates` the payload is merged into the
    /// pending buffer; otherwise it is returned ready to send.
    pub fn build_outbound_many<I, K, V>(&mut self, values: I) -> Option<Outbound>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut payload = Payload::new();
        for (name, value) in values {
            let (id, encoded) = self.build_outbound(name.as_ref(), value)?;
            payload.insert(id.to_string(), encoded);
        }
        Some(self.dispatch(payload))
    }

    fn dispatch(&mut self, payload: Payload) -> Outbound {
        if self.config.delay_updates {
            self.pending.extend(payload);
            Outbound::Queued {
                pending: self.pending.len(),
            }
        } else {
            Outbound::Ready(payload)
        }
    }

    /// Returns the updates waiting to be flushed.
    #[must_use]
    pub fn pending(&self) -> &Payload {
        &self.pending
    }

    /// Takes the pending buffer, leaving it empty.
    pub fn take_pending(&mut self) -> Payload {
        std::mem::take(&mut self.pending)
    }

    /// Puts back updates taken with [`take_pending`](Self::take_pending).
    ///
    /// Entries queued since then win over the restored ones.
    pub fn restore_pending(&mut self, payload: Payload) {
        for (id, value) in payload {
            self.pending.entry(id).or_insert(value);
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

fn group_bytes(dp: &str, raw: &Value) -> Result<Vec<u8>, DecodeError> {
    let Value::String(text) = raw else {
        return Err(DecodeError::UnexpectedType {
            dp: dp.to_string(),
            expected: "base64 string",
        });
    };
    STANDARD.decode(text).map_err(|source| DecodeError::Base64 {
        dp: dp.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::FieldKind;

    fn message(value: Value) -> DpsMessage {
        let Value::Object(dps) = value else {
            panic!("payload must be an object");
        };
        DpsMessage::new(dps).with_timestamp(1_700_000_000)
    }

    #[test]
    fn new_state_is_empty() {
        let state = DeviceState::default();
        assert!(state.total_forward_energy().is_none());
        assert!(state.switch().is_none());
        assert!(state.temperature().is_none());
        assert_eq!(state.sensor_count(), 0);
        assert_eq!(state.groups().count(), 3);
    }

    #[test]
    fn apply_scaled_energy() {
        let mut state = DeviceState::default();
        let update = state.apply(message(json!({"1": 12345}))).unwrap();

        assert_eq!(update.changed_fields, vec!["total_forward_energy"]);
        assert!(update.changed_sensors.is_empty());
        assert_eq!(state.total_forward_energy(), Some(123.45));
        assert_eq!(state.raw_value("total_forward_energy"), Some(&json!(12345)));
    }

    #[test]
    fn apply_is_idempotent() {
        let mut state = DeviceState::default();
        let payload = json!({
            "1": 12345,
            "16": true,
            "103": 41,
            "134": "1",
            "6": "CPwABdwAAVk=",
            "17": "BAEACg==",
            "18": "AQAAZA=="
        });

        let first = state.apply(message(payload.clone())).unwrap();
        assert_eq!(first.changed_fields.len(), 4);
        assert_eq!(first.changed_sensors.len(), 5);

        let second = state.apply(message(payload)).unwrap();
        assert!(second.changed_fields.is_empty());
        assert!(second.changed_sensors.is_empty());
    }

    #[test]
    fn apply_reports_only_changed_fields() {
        let mut state = DeviceState::default();
        state.apply(message(json!({"16": true, "103": 40}))).unwrap();

        let update = state.apply(message(json!({"16": true, "103": 42}))).unwrap();
        assert_eq!(update.changed_fields, vec!["temp_current"]);
        assert_eq!(state.switch(), Some(true));
        assert_eq!(state.temperature(), Some(42));
    }

    #[test]
    fn unknown_ids_pass_through() {
        let mut state = DeviceState::default();
        let update = state.apply(message(json!({"999": "x", "16": false}))).unwrap();
        assert_eq!(update.changed_fields, vec!["switch"]);
        assert_eq!(update.dps.get("999"), Some(&json!("x")));
    }

    #[test]
    fn enum_mismatch_is_kept() {
        let mut state = DeviceState::default();
        let update = state.apply(message(json!({"134": "5"}))).unwrap();
        assert_eq!(update.changed_fields, vec!["relay_power_on_status"]);
        assert_eq!(
            state.value("relay_power_on_status"),
            Some(&FieldValue::from("5"))
        );
        assert!(state.raw_value("relay_power_on_status").is_none());
    }

    #[test]
    fn undecodable_field_is_skipped() {
        let mut state = DeviceState::default();
        let update = state.apply(message(json!({"103": "hot", "16": 1}))).unwrap();
        assert_eq!(update.changed_fields, vec!["switch"]);
        assert!(state.temperature().is_none());
    }

    #[test]
    fn group_data_is_decoded() {
        let mut state = DeviceState::default();
        let update = state.apply(message(json!({"17": "BAEACg=="}))).unwrap();

        assert_eq!(update.changed_sensors.len(), 1);
        let leakage = state.find_sensor("leakage").unwrap();
        assert_eq!(leakage.threshold(), Some(10.0));
        assert_eq!(
            state.group("alarm_set_1").unwrap().timestamp(),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn sensor_indexing_spans_groups() {
        let mut state = DeviceState::default();
        state
            .apply(message(json!({"6": "CPwABdwAAVk=", "18": "AQAAZA=="})))
            .unwrap();

        assert_eq!(state.sensor_count(), 4);
        assert_eq!(state.sensor_at(0).unwrap().name(), "voltage");
        assert_eq!(state.sensor_at(3).unwrap().name(), "over_current");
        assert!(state.sensor_at(4).is_none());
    }

    #[test]
    fn group_errors_are_fatal() {
        let mut state = DeviceState::default();
        let err = state
            .apply(message(json!({"17": "/wEAAQ==", "16": true})))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownAlertType { code: 0xFF, .. }));
        assert!(state.switch().is_none());

        let err = state.apply(message(json!({"6": "AQIDBAUGBw=="}))).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidLength { stride: 8, .. }));

        let err = state.apply(message(json!({"6": 12}))).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedType { .. }));

        let err = state.apply(message(json!({"6": "***"}))).unwrap_err();
        assert!(matches!(err, DecodeError::Base64 { .. }));
    }

    #[test]
    fn failing_group_leaves_other_groups_untouched() {
        let mut state = DeviceState::default();
        let err = state
            .apply(message(json!({"6": "CPwABdwAAVk=", "17": "/wEAAQ==", "16": true})))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownAlertType { code: 0xFF, .. }));
        assert_eq!(state.sensor_count(), 0);
        assert_eq!(state.group("phase_a").unwrap().timestamp(), None);
        assert!(state.switch().is_none());

        let update = state.apply(message(json!({"6": "CPwABdwAAVk="}))).unwrap();
        assert_eq!(update.changed_sensors.len(), 3);
        assert_eq!(update.changed_sensors[0].to_string(), "voltage=230.000");
    }

    const ALT_FIELDS: &[FieldSpec] = &[
        FieldSpec::new("20", "power", FieldKind::ScaledInt(10))
            .with_alt_name("active_power")
            .high_resolution_only(false),
        FieldSpec::new("21", "power", FieldKind::ScaledInt(1000))
            .with_alt_name("active_power")
            .high_resolution_only(true),
    ];

    #[test]
    fn alternate_name_is_reported() {
        let mut state =
            DeviceState::with_parts(BreakerConfig::default(), Registry::new(ALT_FIELDS), Vec::new());
        let update = state.apply(message(json!({"20": 55}))).unwrap();
        assert_eq!(update.changed_fields, vec!["power", "active_power"]);
        assert_eq!(state.value("active_power"), Some(&FieldValue::Float(5.5)));
    }

    #[test]
    fn high_resolution_selects_field() {
        let config = BreakerConfig::new().with_high_resolution(true);
        let state = DeviceState::with_parts(config, Registry::new(ALT_FIELDS), Vec::new());
        assert_eq!(state.build_outbound("power", 1.5), Some(("21", json!(1500))));

        let state = DeviceState::with_parts(
            BreakerConfig::default(),
            Registry::new(ALT_FIELDS),
            Vec::new(),
        );
        assert_eq!(state.build_outbound("power", 1.5), Some(("20", json!(15))));
    }

    #[test]
    fn fields_yields_alternate_first() {
        let state =
            DeviceState::with_parts(BreakerConfig::default(), Registry::new(ALT_FIELDS), Vec::new());
        let names: Vec<&str> = state.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["active_power", "power", "active_power", "power"]);
    }

    #[test]
    fn build_outbound_encodes() {
        let state = DeviceState::default();
        assert_eq!(state.build_outbound("switch", true), Some(("16", json!(true))));
        assert_eq!(
            state.build_outbound("charge_energy", 12.5),
            Some(("14", json!(1250)))
        );
        assert_eq!(
            state.build_outbound("relay_power_on_status", "2"),
            Some(("134", json!("2")))
        );
        assert_eq!(state.build_outbound("nope", 1), None);
        assert_eq!(state.build_outbound("switch", "on"), None);
    }

    #[test]
    fn build_many_immediate() {
        let mut state = DeviceState::default();
        let outbound = state
            .build_outbound_many([("switch", FieldValue::from(false)), ("reclose_recover", 3.into())])
            .unwrap();

        let payload = outbound.into_payload().unwrap();
        assert_eq!(payload.get("16"), Some(&json!(false)));
        assert_eq!(payload.get("107"), Some(&json!(3)));
        assert!(state.pending().is_empty());
    }

    #[test]
    fn build_many_deferred_merges() {
        let config = BreakerConfig::new().with_delay_updates(true);
        let mut state = DeviceState::new(config);

        assert_eq!(
            state.build_outbound_many([("switch", true)]),
            Some(Outbound::Queued { pending: 1 })
        );
        assert_eq!(
            state.stage("reclosing_enabled", false),
            Some(Outbound::Queued { pending: 2 })
        );
        assert_eq!(
            state.build_outbound_many([("switch", false)]),
            Some(Outbound::Queued { pending: 2 })
        );

        let pending = state.take_pending();
        assert_eq!(pending.get("16"), Some(&json!(false)));
        assert_eq!(pending.get("104"), Some(&json!(false)));
        assert!(state.pending().is_empty());
    }

    #[test]
    fn failed_lookup_leaves_pending_untouched() {
        let config = BreakerConfig::new().with_delay_updates(true);
        let mut state = DeviceState::new(config);
        state.stage("switch", true).unwrap();

        assert!(state.stage("missing", 1).is_none());
        assert!(
            state
                .build_outbound_many([("reclose_recover", FieldValue::Int(1)), ("missing", 2.into())])
                .is_none()
        );
        assert_eq!(state.pending().len(), 1);
        assert!(state.pending().get("107").is_none());
    }
}
