// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scalar decode and encode rules.
//!
//! Both directions are lenient: a value that does not fit the field's kind
//! yields `None` and a warning, never an error.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::{FieldKind, FieldSpec};
use crate::types::FieldValue;

/// Decodes a raw payload value according to the field's kind.
///
/// Returns `None` if the raw value cannot be interpreted for this kind.
/// Enumeration values outside the allowed list are kept.
#[must_use]
pub fn decode(spec: &FieldSpec, raw: &Value) -> Option<FieldValue> {
    let decoded = match spec.kind {
        FieldKind::Bool => Some(FieldValue::Bool(truthy(raw))),
        FieldKind::Int => raw_int(raw).map(FieldValue::Int),
        FieldKind::ScaledInt(scale) => {
            raw_number(raw).map(|v| FieldValue::Float(v / f64::from(scale)))
        }
        FieldKind::Enum(allowed) => FieldValue::from_json(raw).inspect(|value| {
            if !is_member(allowed, value) {
                tracing::warn!(
                    dp = spec.id,
                    field = spec.name,
                    value = %value,
                    allowed = ?allowed,
                    "Received value not in enum list, keeping it"
                );
            }
        }),
        FieldKind::RawBytesBase64 => raw
            .as_str()
            .and_then(|s| STANDARD.decode(s).ok())
            .map(FieldValue::Bytes),
        FieldKind::Custom(codec) => codec.decode(raw),
    };

    if decoded.is_none() {
        tracing::warn!(dp = spec.id, field = spec.name, raw = %raw, "Cannot decode value");
    }
    decoded
}

/// Encodes a value for transmission according to the field's kind.
///
/// Scaled integers are multiplied by their scale and truncated toward zero.
/// Returns `None` if the value does not fit the kind.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode(spec: &FieldSpec, value: &FieldValue) -> Option<Value> {
    let encoded = match spec.kind {
        FieldKind::Bool => match value {
            FieldValue::Bool(b) => Some(Value::Bool(*b)),
            FieldValue::Int(i) => Some(Value::Bool(*i != 0)),
            _ => None,
        },
        FieldKind::Int => match value {
            FieldValue::Int(i) => Some(Value::from(*i)),
            FieldValue::Float(f) if f.is_finite() => Some(Value::from(f.trunc() as i64)),
            _ => None,
        },
        FieldKind::ScaledInt(scale) => value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| Value::from((v * f64::from(scale)).trunc() as i64)),
        FieldKind::Enum(allowed) => {
            if !is_member(allowed, value) {
                tracing::warn!(
                    dp = spec.id,
                    field = spec.name,
                    value = %value,
                    allowed = ?allowed,
                    "Requested value not in enum list, setting anyway"
                );
            }
            Some(value.to_json())
        }
        FieldKind::RawBytesBase64 => value
            .as_bytes()
            .map(|b| Value::String(STANDARD.encode(b))),
        FieldKind::Custom(codec) => codec.encode(value),
    };

    if encoded.is_none() {
        tracing::warn!(dp = spec.id, field = spec.name, value = %value, "Cannot encode value");
    }
    encoded
}

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn raw_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn raw_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Numbers are compared by their decimal rendering so that `1` matches `"1"`.
fn is_member(allowed: &[&str], value: &FieldValue) -> bool {
    let rendered = value.to_string();
    allowed.contains(&rendered.as_str())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const ENERGY: FieldSpec = FieldSpec::new("1", "energy", FieldKind::ScaledInt(100));
    const STATUS: FieldSpec = FieldSpec::new("134", "status", FieldKind::Enum(&["0", "1", "2"]));

    #[test]
    fn scaled_int_decode() {
        assert_eq!(decode(&ENERGY, &json!(12345)), Some(FieldValue::Float(123.45)));
        assert_eq!(decode(&ENERGY, &json!("250")), Some(FieldValue::Float(2.5)));
        assert_eq!(decode(&ENERGY, &json!(true)), None);
    }

    #[test]
    fn scaled_int_encode_truncates_toward_zero() {
        assert_eq!(encode(&ENERGY, &FieldValue::Float(1.239)), Some(json!(123)));
        assert_eq!(encode(&ENERGY, &FieldValue::Float(-1.239)), Some(json!(-123)));
        assert_eq!(encode(&ENERGY, &FieldValue::Int(5)), Some(json!(500)));
    }

    #[test]
    fn scaled_int_round_trip_for_integers() {
        for v in [-1_000_000_i64, -7, 0, 1, 42, 99_999, 21_474_836] {
            let wire = encode(&ENERGY, &FieldValue::Int(v)).unwrap();
            #[allow(clippy::cast_precision_loss)]
            let expected = FieldValue::Float(v as f64);
            assert_eq!(decode(&ENERGY, &wire), Some(expected));
        }
    }

    #[test]
    fn bool_decode_is_truthiness() {
        let spec = FieldSpec::new("16", "switch", FieldKind::Bool);
        assert_eq!(decode(&spec, &json!(true)), Some(FieldValue::Bool(true)));
        assert_eq!(decode(&spec, &json!(0)), Some(FieldValue::Bool(false)));
        assert_eq!(decode(&spec, &json!(3)), Some(FieldValue::Bool(true)));
        assert_eq!(decode(&spec, &json!("")), Some(FieldValue::Bool(false)));
    }

    #[test]
    fn int_decode_accepts_numeric_strings() {
        let spec = FieldSpec::new("103", "temp", FieldKind::Int);
        assert_eq!(decode(&spec, &json!("41")), Some(FieldValue::Int(41)));
        assert_eq!(decode(&spec, &json!(41.9)), Some(FieldValue::Int(41)));
        assert_eq!(decode(&spec, &json!("hot")), None);
    }

    #[test]
    fn enum_keeps_unexpected_value() {
        assert_eq!(
            decode(&STATUS, &json!("7")),
            Some(FieldValue::Text("7".to_string()))
        );
        assert_eq!(encode(&STATUS, &FieldValue::from("9")), Some(json!("9")));
    }

    #[test]
    fn enum_membership_by_rendering() {
        assert!(is_member(&["0", "1"], &FieldValue::Int(1)));
        assert!(is_member(&["0", "1"], &FieldValue::from("0")));
        assert!(!is_member(&["0", "1"], &FieldValue::Int(2)));
    }

    #[test]
    fn base64_round_trip() {
        let spec = FieldSpec::new("9", "blob", FieldKind::RawBytesBase64);
        let wire = encode(&spec, &FieldValue::Bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(wire, json!("AQID"));
        assert_eq!(decode(&spec, &wire), Some(FieldValue::Bytes(vec![1, 2, 3])));
        assert_eq!(decode(&spec, &json!("not base64!")), None);
    }

    #[derive(Debug)]
    struct Celsius;

    impl crate::registry::FieldCodec for Celsius {
        fn decode(&self, raw: &Value) -> Option<FieldValue> {
            raw.as_i64().map(|t| FieldValue::Text(format!("{t}C")))
        }

        fn encode(&self, value: &FieldValue) -> Option<Value> {
            value
                .as_str()
                .and_then(|s| s.trim_end_matches('C').parse::<i64>().ok())
                .map(Value::from)
        }
    }

    static CELSIUS: Celsius = Celsius;

    #[test]
    fn custom_codec_is_used() {
        let spec = FieldSpec::new("5", "temp", FieldKind::Custom(&CELSIUS));
        assert_eq!(decode(&spec, &json!(21)), Some(FieldValue::from("21C")));
        assert_eq!(encode(&spec, &FieldValue::from("18C")), Some(json!(18)));
    }
}
