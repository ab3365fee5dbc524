// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Cycle schedulers of the positioning pipeline.
//!
//! The mode is chosen once at startup: [`live::LiveScheduler`] drives the
//! receiver channels, [`playback::ReplayScheduler`] re-emits a persisted log.
//! Both hand their outputs to the event bus as
//! [`FusedFixEvent`](module_core::EventKind::FusedFixEvent).

pub mod config;
pub mod live;
pub mod playback;
