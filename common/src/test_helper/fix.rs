// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::position::Fix;
use chrono::{DateTime, TimeDelta, Utc};

/// Observation time used by [`fix_at`]: 2024-03-01 12:00:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_709_294_400, 0).unwrap_or_default()
}

/// Builds a valid fix observed `offset_ms` milliseconds after [`base_time`].
///
/// Panics if the coordinates are out of range, which is a bug in the test.
pub fn fix_at(latitude: f64, longitude: f64, heading: Option<f64>, offset_ms: i64) -> Fix {
    Fix::new(
        latitude,
        longitude,
        heading,
        base_time() + TimeDelta::milliseconds(offset_ms),
    )
    .unwrap_or_else(|e| panic!("Invalid test fix. Reason: {e}"))
}

/// A short track of fixes on the test field, heading present on every second fix.
pub fn test_track() -> Vec<Fix> {
    vec![
        fix_at(52.026649, 11.282535, Some(84.4), 0),
        fix_at(52.026751, 11.282047, None, 100),
        fix_at(52.026807, 11.281746, Some(271.25), 200),
    ]
}
