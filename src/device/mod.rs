// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level breaker abstraction.
//!
//! [`BreakerDevice`] pairs a [`DeviceState`] with a [`DeviceSession`]: inbound
//! messages go through the state, outbound updates and session requests go
//! out through the session.
//!
//! ```
//! use breaker_lib::command::SessionCommand;
//! use breaker_lib::error::SessionError;
//! use breaker_lib::protocol::DeviceSession;
//! use breaker_lib::types::DpsMessage;
//! use breaker_lib::{BreakerConfig, BreakerDevice};
//!
//! struct Log(Vec<SessionCommand>);
//!
//! impl DeviceSession for Log {
//!     fn send(&mut self, command: SessionCommand) -> Result<(), SessionError> {
//!         self.0.push(command);
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> breaker_lib::Result<()> {
//! let mut breaker = BreakerDevice::new(Log(Vec::new()), BreakerConfig::default());
//!
//! breaker.send_status_request()?;
//! let update = breaker.receive_json(r#"{"dps":{"16":true,"103":38}}"#)?;
//! assert!(update.field_changed("switch"));
//! assert_eq!(breaker.temperature(), Some(38));
//!
//! breaker.set_value("switch", false)?;
//! assert_eq!(breaker.session().0.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::command::SessionCommand;
use crate::config::BreakerConfig;
use crate::error::Result;
use crate::protocol::DeviceSession;
use crate::state::{DeviceState, Outbound, StateUpdate};
use crate::types::{DpsMessage, FieldValue};

/// A breaker bound to its device session.
#[derive(Debug)]
pub struct BreakerDevice<S> {
    session: S,
    state: DeviceState,
}

impl<S: DeviceSession> BreakerDevice<S> {
    /// Creates a breaker with the standard fields and sensor groups.
    #[must_use]
    pub fn new(session: S, config: BreakerConfig) -> Self {
        Self::with_state(session, DeviceState::new(config))
    }

    /// Creates a breaker around an existing state.
    #[must_use]
    pub fn with_state(session: S, state: DeviceState) -> Self {
        Self { session, state }
    }

    /// Returns the tracked state.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Returns the session.
    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Returns the session mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Splits the breaker into its session and state.
    #[must_use]
    pub fn into_parts(self) -> (S, DeviceState) {
        (self.session, self.state)
    }

    // ========== Inbound ==========

    /// Applies a message received by the session.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if a sensor group record is malformed.
    pub fn receive(&mut self, message: DpsMessage) -> Result<StateUpdate> {
        Ok(self.state.apply(message)?)
    }

    /// Parses and applies a message in its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the text is not a valid message, or
    /// `Error::Decode` if a sensor group record is malformed.
    pub fn receive_json(&mut self, text: &str) -> Result<StateUpdate> {
        let message = DpsMessage::from_json(text)?;
        self.receive(message)
    }

    // ========== Session Requests ==========

    /// Sends a heartbeat.
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` if the session rejects the request.
    pub fn send_ping(&mut self) -> Result<()> {
        self.send(SessionCommand::Heartbeat)
    }

    /// Asks the device to report all data points.
    ///
    /// The answer arrives later as an inbound message.
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` if the session rejects the request.
    pub fn send_status_request(&mut self) -> Result<()> {
        self.send(SessionCommand::StatusQuery)
    }

    // ========== Outbound ==========

    /// Sets one field on the device.
    ///
    /// With `delay_updates` the value is queued until
    /// [`flush_updates`](Self::flush_updates). Returns `Ok(false)` if the
    /// field name does not resolve or the value does not fit the field.
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` if the session rejects the request.
    pub fn set_value(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<bool> {
        match self.state.stage(name, value) {
            Some(outbound) => self.deliver(outbound).map(|()| true),
            None => Ok(false),
        }
    }

    /// Sets several fields in one request.
    ///
    /// Nothing is sent or queued unless every entry resolves; in that case
    /// `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` if the session rejects the request.
    pub fn set_values<I, K, V>(&mut self, values: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        match self.state.build_outbound_many(values) {
            Some(outbound) => self.deliver(outbound).map(|()| true),
            None => Ok(false),
        }
    }

    /// Sends every queued update as one control request.
    ///
    /// Returns the number of data points sent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` if the session rejects the request. The
    /// queued updates stay queued in that case.
    pub fn flush_updates(&mut self) -> Result<usize> {
        let pending = self.state.take_pending();
        if pending.is_empty() {
            return Ok(0);
        }
        let count = pending.len();
        if let Err(err) = self.send(SessionCommand::Control(pending.clone())) {
            tracing::warn!(pending = count, error = %err, "Flush failed, keeping queued updates");
            self.state.restore_pending(pending);
            return Err(err);
        }
        Ok(count)
    }

    fn deliver(&mut self, outbound: Outbound) -> Result<()> {
        match outbound {
            Outbound::Ready(payload) => self.send(SessionCommand::Control(payload)),
            Outbound::Queued { pending } => {
                tracing::debug!(pending, "Queued outbound update");
                Ok(())
            }
        }
    }

    fn send(&mut self, command: SessionCommand) -> Result<()> {
        tracing::debug!(code = %command.code(), "Sending session request");
        self.session.send(command)?;
        Ok(())
    }

    // ========== Convenience Getters ==========

    /// Gets a field value by primary or alternate name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.state.value(name)
    }

    /// Gets the total forward energy in kWh.
    #[must_use]
    pub fn total_forward_energy(&self) -> Option<f64> {
        self.state.total_forward_energy()
    }

    /// Gets the switch state.
    #[must_use]
    pub fn switch(&self) -> Option<bool> {
        self.state.switch()
    }

    /// Gets the internal temperature in degrees Celsius.
    #[must_use]
    pub fn temperature(&self) -> Option<i64> {
        self.state.temperature()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{Error, SessionError};

    #[derive(Debug, Default)]
    struct Recorder {
        sent: Vec<SessionCommand>,
        closed: bool,
    }

    impl DeviceSession for Recorder {
        fn send(&mut self, command: SessionCommand) -> std::result::Result<(), SessionError> {
            if self.closed {
                return Err(SessionError::Closed);
            }
            self.sent.push(command);
            Ok(())
        }
    }

    fn breaker(config: BreakerConfig) -> BreakerDevice<Recorder> {
        BreakerDevice::new(Recorder::default(), config)
    }

    #[test]
    fn ping_and_status_request() {
        let mut dev = breaker(BreakerConfig::default());
        dev.send_ping().unwrap();
        dev.send_status_request().unwrap();
        assert_eq!(
            dev.session().sent,
            vec![SessionCommand::Heartbeat, SessionCommand::StatusQuery]
        );
    }

    #[test]
    fn set_value_sends_immediately() {
        let mut dev = breaker(BreakerConfig::default());
        assert!(dev.set_value("charge_energy", 10.0).unwrap());

        let Some(SessionCommand::Control(payload)) = dev.session().sent.first() else {
            panic!("expected a control request");
        };
        assert_eq!(payload.get("14"), Some(&json!(1000)));
    }

    #[test]
    fn unknown_name_sends_nothing() {
        let mut dev = breaker(BreakerConfig::default());
        assert!(!dev.set_value("volume", 3).unwrap());
        assert!(!dev.set_values([("switch", FieldValue::Bool(true)), ("volume", 3.into())]).unwrap());
        assert!(dev.session().sent.is_empty());
    }

    #[test]
    fn delayed_updates_flush_as_one_request() {
        let mut dev = breaker(BreakerConfig::new().with_delay_updates(true));
        assert!(dev.set_value("switch", true).unwrap());
        assert!(dev.set_values([("reclosing_allowed_times", 3), ("reclose_recover", 1)]).unwrap());
        assert!(dev.session().sent.is_empty());

        assert_eq!(dev.flush_updates().unwrap(), 3);
        assert_eq!(dev.session().sent.len(), 1);
        assert_eq!(dev.flush_updates().unwrap(), 0);
        assert_eq!(dev.session().sent.len(), 1);
    }

    #[test]
    fn session_errors_propagate() {
        let mut dev = breaker(BreakerConfig::default());
        dev.session_mut().closed = true;
        let err = dev.send_ping().unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::Closed)));
    }

    #[test]
    fn failed_flush_keeps_queued_updates() {
        let mut dev = breaker(BreakerConfig::new().with_delay_updates(true));
        dev.set_value("switch", false).unwrap();
        dev.set_value("charge_energy", 10.0).unwrap();

        dev.session_mut().closed = true;
        let err = dev.flush_updates().unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::Closed)));
        assert_eq!(dev.state().pending().len(), 2);

        dev.session_mut().closed = false;
        assert_eq!(dev.flush_updates().unwrap(), 2);
        let Some(SessionCommand::Control(payload)) = dev.session().sent.first() else {
            panic!("expected a control request");
        };
        assert_eq!(payload.get("16"), Some(&json!(false)));
        assert_eq!(payload.get("14"), Some(&json!(1000)));
        assert!(dev.state().pending().is_empty());
    }

    #[test]
    fn receive_json_updates_getters() {
        let mut dev = breaker(BreakerConfig::default());
        let update = dev
            .receive_json(r#"{"dps":{"1":250075,"16":true},"t":1700000000}"#)
            .unwrap();
        assert_eq!(update.timestamp, 1_700_000_000);
        assert_eq!(dev.total_forward_energy(), Some(2500.75));
        assert_eq!(dev.switch(), Some(true));
    }

    #[test]
    fn receive_json_rejects_garbage() {
        let mut dev = breaker(BreakerConfig::default());
        assert!(matches!(dev.receive_json("nope"), Err(Error::Parse(_))));
    }
}
