// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the breaker library.
//!
//! Only conditions that invalidate a whole record are errors: malformed
//! binary sensor data, unparseable envelopes, and session failures. Unknown
//! field names and out-of-range enum values are logged and skipped instead.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A data-point value could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An inbound message could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The device session rejected a request.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Errors raised while decoding packed sensor group records.
///
/// Any of these rejects the whole record: the group keeps the entries it
/// had before the update.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The record length is not a multiple of the group's stride.
    #[error("{group}: data length {actual} is not a multiple of {stride} bytes")]
    InvalidLength {
        /// Name of the group that rejected the record.
        group: String,
        /// Size of one record entry in bytes.
        stride: usize,
        /// The length that was received.
        actual: usize,
    },

    /// An alarm entry carries an alert-type code the group does not know.
    #[error("{group}: unknown alert type 0x{code:02x}")]
    UnknownAlertType {
        /// Name of the group that rejected the record.
        group: String,
        /// The unrecognized alert-type byte.
        code: u8,
    },

    /// The data-point value is not valid base64.
    #[error("data point {dp}: invalid base64: {source}")]
    Base64 {
        /// The data-point ID carrying the value.
        dp: String,
        /// The underlying decoder error.
        #[source]
        source: base64::DecodeError,
    },

    /// The data-point value has the wrong JSON type.
    #[error("data point {dp}: expected {expected}")]
    UnexpectedType {
        /// The data-point ID carrying the value.
        dp: String,
        /// Description of the expected type.
        expected: &'static str,
    },
}

/// Errors related to parsing inbound messages.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by the device session collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session is closed.
    #[error("session is closed")]
    Closed,

    /// The request could not be sent.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
