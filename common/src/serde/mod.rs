//! Serde helpers for the persisted formats.

pub mod timestamp;
