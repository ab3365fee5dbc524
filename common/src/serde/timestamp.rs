// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! (De)serializes a UTC timestamp as decimal seconds since the Unix epoch.
//!
//! The value is carried with microsecond resolution, so a timestamp that is
//! already truncated to microseconds survives a round trip unchanged.

use chrono::{DateTime, Utc};
use serde::{self, Deserialize, Deserializer, Serializer};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

pub fn to_seconds(timestamp: &DateTime<Utc>) -> f64 {
    timestamp.timestamp_micros() as f64 / MICROS_PER_SECOND
}

pub fn from_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_micros((seconds * MICROS_PER_SECOND).round() as i64)
}

pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(to_seconds(timestamp))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    from_seconds(seconds)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {seconds}")))
}
