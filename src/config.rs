// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device configuration.

use serde::{Deserialize, Serialize};

use crate::sensor::PhaseScale;

/// Construction-time settings for one breaker.
///
/// # Examples
///
/// ```
/// use breaker_lib::BreakerConfig;
///
/// let config = BreakerConfig::new()
///     .with_high_resolution(true)
///     .with_delay_updates(true);
///
/// assert!(config.high_resolution);
/// assert!(config.delay_updates);
///
/// // Missing keys fall back to defaults
/// let config: BreakerConfig = serde_json::from_str(r#"{"delay_updates":true}"#).unwrap();
/// assert!(!config.high_resolution);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Selects between fields that share a name but differ in precision.
    pub high_resolution: bool,
    /// Queues outbound updates until they are flushed instead of
    /// returning them immediately.
    pub delay_updates: bool,
    /// Divisors for the phase record readings.
    pub phase_scale: PhaseScale,
}

impl BreakerConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the high-resolution flag.
    #[must_use]
    pub fn with_high_resolution(mut self, enabled: bool) -> Self {
        self.high_resolution = enabled;
        self
    }

    /// Sets deferred outbound mode.
    #[must_use]
    pub fn with_delay_updates(mut self, enabled: bool) -> Self {
        self.delay_updates = enabled;
        self
    }

    /// Sets the phase record divisors.
    #[must_use]
    pub fn with_phase_scale(mut self, scale: PhaseScale) -> Self {
        self.phase_scale = scale;
        self
    }
}
