// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use std::{fmt, str::FromStr};

/// Identifies one of the two independent receiver channels.
///
/// Every channel owns its own byte stream, its own sentence dialect and its
/// own fix log. The two channels only meet in the fusion step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelId {
    A,
    B,
}

impl ChannelId {
    /// Both channels in their canonical order.
    pub const ALL: [ChannelId; 2] = [ChannelId::A, ChannelId::B];

    /// Lower case name used in log messages and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::A => "a",
            ChannelId::B => "b",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "1" => Ok(ChannelId::A),
            "b" | "2" => Ok(ChannelId::B),
            other => Err(format!("unknown channel \"{other}\", expected a or b")),
        }
    }
}
