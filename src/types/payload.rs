// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data-point payloads exchanged with the device session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;

/// A data-point ID to raw value map.
///
/// Keys are the vendor data-point IDs (`"1"`, `"16"`, ...). Values are the
/// raw JSON primitives the device sent, or base64 strings for packed records.
pub type Payload = serde_json::Map<String, Value>;

/// An inbound message as delivered by the device session.
///
/// The session has already removed framing and encryption; what remains is
/// the data-point map and an optional event time in Unix seconds.
///
/// # Examples
///
/// ```
/// use breaker_lib::types::DpsMessage;
///
/// let msg = DpsMessage::from_json(r#"{"dps":{"1":12345,"16":true},"t":1700000000}"#).unwrap();
/// assert_eq!(msg.dps.len(), 2);
/// assert_eq!(msg.timestamp(), 1_700_000_000);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DpsMessage {
    /// The data points carried by the message.
    #[serde(default)]
    pub dps: Payload,

    /// Event time in Unix seconds, if the device reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<i64>,
}

impl DpsMessage {
    /// Creates a message from a payload with no event time.
    #[must_use]
    pub fn new(dps: Payload) -> Self {
        Self { dps, t: None }
    }

    /// Sets the event time.
    #[must_use]
    pub fn with_timestamp(mut self, t: i64) -> Self {
        self.t = Some(t);
        self
    }

    /// Parses a message from its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the text is not a valid message.
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        serde_json::from_str(text).map_err(Into::into)
    }

    /// Returns the event time, falling back to the current time.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.t.unwrap_or_else(|| chrono::Utc::now().timestamp())
    }
}

impl From<Payload> for DpsMessage {
    fn from(dps: Payload) -> Self {
        Self::new(dps)
    }
}
