// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::channel::ChannelId;
use std::time::Duration;
use thiserror::Error;

/// Failures that can occur along the positioning pipeline.
///
/// Only [`NavError::DeviceUnavailable`] at startup is fatal. Every other
/// variant degrades a single channel to "no fix" for the current cycle or,
/// for [`NavError::PersistenceFailure`], degrades durability but not liveness.
#[derive(Debug, Error)]
pub enum NavError {
    /// The hardware behind a byte stream could not be opened or was lost.
    #[error("device {path} unavailable: {reason}")]
    DeviceUnavailable { path: String, reason: String },

    /// No complete line arrived within the read timeout.
    #[error("no line received within {0:?}")]
    ReadTimeout(Duration),

    /// The line is not a sentence of the expected dialect or is truncated.
    #[error("malformed sentence \"{line}\": {reason}")]
    MalformedSentence { line: String, reason: String },

    /// A single coordinate or heading token could not be decoded.
    #[error("malformed token \"{token}\": {reason}")]
    MalformedToken { token: String, reason: &'static str },

    /// The decoded position lies outside of the valid WGS84 range.
    #[error("coordinate out of range (lat: {latitude}, lon: {longitude})")]
    OutOfRangeCoordinate { latitude: f64, longitude: f64 },

    /// The decoded heading is not a finite angle.
    #[error("heading {0} is not a finite angle")]
    InvalidHeading(f64),

    /// A fix could not be written to the channel log.
    #[error("failed to persist fix of channel {channel}: {source}")]
    PersistenceFailure {
        channel: ChannelId,
        #[source]
        source: std::io::Error,
    },

    /// A replayed log has no further entries.
    #[error("fix store exhausted")]
    StoreExhausted,
}

impl NavError {
    /// Returns `true` for conditions that only cost the current cycle its fix.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, NavError::DeviceUnavailable { .. })
    }
}
