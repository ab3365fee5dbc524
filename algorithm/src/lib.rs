//! Stateless building blocks of the positioning pipeline.
//!
//! - [`nmea`] splits raw receiver sentences into coordinate tokens.
//! - [`coordinate`] turns those tokens into validated fixes.
//! - [`fusion`] combines the latest fix of every channel into one output.

pub mod coordinate;
pub mod fusion;
pub mod nmea;
