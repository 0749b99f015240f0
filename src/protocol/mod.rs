// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device session seam.
//!
//! Transport, encryption, framing and retries live outside this library, in
//! whatever implements [`DeviceSession`]. The library only hands it
//! [`SessionCommand`]s.

use crate::command::SessionCommand;
use crate::error::SessionError;

/// A connection to one physical device.
///
/// Implementations frame, encrypt and transmit commands. Sending is fire and
/// forget: any response arrives later as an inbound message.
pub trait DeviceSession {
    /// Sends a command to the device.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the command could not be handed to the
    /// transport.
    fn send(&mut self, command: SessionCommand) -> Result<(), SessionError>;
}

impl<S: DeviceSession + ?Sized> DeviceSession for &mut S {
    fn send(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        (**self).send(command)
    }
}

impl<S: DeviceSession + ?Sized> DeviceSession for Box<S> {
    fn send(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        (**self).send(command)
    }
}
