// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Requests handed to the device session.
//!
//! The library never frames or transmits anything itself. It produces a
//! [`SessionCommand`] and the session turns it into a protocol packet.
//!
//! | Command | Code | Payload |
//! |---------|------|---------|
//! | [`SessionCommand::Control`] | 7 | data points to set |
//! | [`SessionCommand::Heartbeat`] | 9 | none |
//! | [`SessionCommand::StatusQuery`] | 10 | none |
//!
//! # Examples
//!
//! ```
//! use breaker_lib::command::{CommandCode, SessionCommand};
//!
//! let ping = SessionCommand::Heartbeat;
//! assert_eq!(ping.code(), CommandCode::HeartBeat);
//! assert_eq!(ping.code().as_u8(), 9);
//! assert!(ping.payload().is_none());
//! ```

use std::fmt;

use crate::types::Payload;

/// Numeric command codes of the vendor protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    /// Set data points.
    Control = 7,
    /// Keep the session alive.
    HeartBeat = 9,
    /// Ask for every data point.
    DpQuery = 10,
}

impl CommandCode {
    /// Returns the code as sent on the wire.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Control => "CONTROL",
            Self::HeartBeat => "HEART_BEAT",
            Self::DpQuery => "DP_QUERY",
        };
        f.write_str(name)
    }
}

/// A fire-and-forget request for the device session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Send a heartbeat.
    Heartbeat,
    /// Ask the device to report its status.
    StatusQuery,
    /// Set the given data points.
    Control(Payload),
}

impl SessionCommand {
    /// Returns the protocol command code.
    #[must_use]
    pub fn code(&self) -> CommandCode {
        match self {
            Self::Heartbeat => CommandCode::HeartBeat,
            Self::StatusQuery => CommandCode::DpQuery,
            Self::Control(_) => CommandCode::Control,
        }
    }

    /// Returns the data points carried by the request, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Control(payload) => Some(payload),
            Self::Heartbeat | Self::StatusQuery => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(SessionCommand::StatusQuery.code().as_u8(), 10);
        assert_eq!(SessionCommand::Control(Payload::new()).code().as_u8(), 7);
        assert_eq!(CommandCode::DpQuery.to_string(), "DP_QUERY");
    }

    #[test]
    fn control_carries_payload() {
        let mut dps = Payload::new();
        dps.insert("16".to_string(), true.into());
        let cmd = SessionCommand::Control(dps);
        assert_eq!(cmd.payload().unwrap().len(), 1);
        assert!(SessionCommand::StatusQuery.payload().is_none());
    }
}
