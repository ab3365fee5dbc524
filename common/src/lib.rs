// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Common Modul for the positioning pipeline
//!
//! Provides the common data types that are used across every modul.

pub mod channel;
pub mod clock;
pub mod error;
pub mod position;
pub mod serde;
pub mod test_helper;

#[cfg(test)]
mod tests;
