// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use chrono::{DateTime, TimeDelta, Utc};
use common::serde::timestamp;
use common::test_helper::fix::base_time;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Stamped {
    #[serde(with = "timestamp")]
    at: DateTime<Utc>,
}

#[test]
pub fn serialize_timestamp_as_epoch_seconds() {
    let stamped = Stamped {
        at: base_time() + TimeDelta::milliseconds(250),
    };
    let json = serde_json::to_string(&stamped).unwrap();
    assert_eq!(json, r#"{"at":1709294400.25}"#);
}

#[test]
pub fn restore_microsecond_timestamp() {
    let stamped = Stamped {
        at: base_time() + TimeDelta::microseconds(123_457),
    };
    let json = serde_json::to_string(&stamped).unwrap();
    let restored: Stamped = serde_json::from_str(&json)
        .unwrap_or_else(|e| panic!("Failed to deserialize the raw json. Reason: {e}"));
    assert_eq!(restored, stamped);
}

#[test]
pub fn reject_non_numeric_timestamp() {
    let result = serde_json::from_str::<Stamped>(r#"{"at":"yesterday"}"#);
    assert!(result.is_err());
}
