// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Receiver channels of the positioning pipeline.
//!
//! A channel reads one line per cycle from its [`LineSource`](source::LineSource),
//! extracts a fix with its sentence dialect and appends every accepted fix to
//! its log before handing it to fusion.

pub mod channel;
pub mod serial_source;
pub mod source;
pub mod test_helper;
