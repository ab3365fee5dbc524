// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Helpers shared by the tests of every crate in the workspace.

pub mod fix;
pub mod manual_clock;
