use crate::error::NavError;
use chrono::{DateTime, SubsecRound, Utc};
use std::ops::RangeInclusive;

/// Valid latitude range in decimal degrees.
pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in decimal degrees.
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// Heading reported at the publish boundary when no receiver reported one.
pub const DEFAULT_HEADING: f64 = 0.0;

/// A single normalized and validated observation of one receiver.
///
/// A `Fix` can only be constructed through [`Fix::new`], which enforces the
/// WGS84 range of latitude and longitude. Once created it is immutable and
/// cheap to copy, so every consumer (store, fusion) works on its own copy.
///
/// The heading stays `None` when the receiver did not report one. The default
/// of [`DEFAULT_HEADING`] is applied at the publish boundary only, so "no
/// heading" remains distinguishable from "heading due north".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fix {
    latitude: f64,
    longitude: f64,
    heading: Option<f64>,
    observed_at: DateTime<Utc>,
}

impl Fix {
    /// Creates a new validated [`Fix`].
    ///
    /// # Arguments
    ///
    /// * `latitude` – Latitude in decimal degrees, positive for the northern hemisphere.
    /// * `longitude` – Longitude in decimal degrees, positive for the eastern hemisphere.
    /// * `heading` – Course over ground in degrees, wrapped into `[0, 360)`.
    /// * `observed_at` – Time of observation, truncated to microseconds.
    ///
    /// # Errors
    ///
    /// * [`NavError::OutOfRangeCoordinate`] if latitude or longitude is not finite
    ///   or outside of [`LATITUDE_RANGE`] / [`LONGITUDE_RANGE`].
    /// * [`NavError::InvalidHeading`] if the heading is not finite.
    ///
    /// # Example
    ///
    /// ```rust
    /// use common::position::Fix;
    ///
    /// let fix = Fix::new(52.02, 11.28, Some(370.0), chrono::Utc::now()).unwrap();
    /// assert_eq!(fix.heading(), Some(10.0));
    /// ```
    pub fn new(
        latitude: f64,
        longitude: f64,
        heading: Option<f64>,
        observed_at: DateTime<Utc>,
    ) -> Result<Fix, NavError> {
        if !LATITUDE_RANGE.contains(&latitude) || !LONGITUDE_RANGE.contains(&longitude) {
            return Err(NavError::OutOfRangeCoordinate {
                latitude,
                longitude,
            });
        }
        let heading = match heading {
            Some(h) if !h.is_finite() => return Err(NavError::InvalidHeading(h)),
            Some(h) => {
                // rem_euclid rounds tiny negative angles up to exactly 360
                let wrapped = h.rem_euclid(360.0);
                Some(if wrapped >= 360.0 { 0.0 } else { wrapped })
            }
            None => None,
        };
        Ok(Fix {
            latitude,
            longitude,
            heading,
            observed_at: observed_at.trunc_subsecs(6),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns the reported heading, `None` if the receiver reported none.
    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

/// The fused position handed to the publish boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusedFix {
    pub latitude: f64,
    pub longitude: f64,
    pub heading: Option<f64>,
}

impl FusedFix {
    /// Returns the heading or [`DEFAULT_HEADING`] if none was reported.
    pub fn heading_or_default(&self) -> f64 {
        self.heading.unwrap_or(DEFAULT_HEADING)
    }

    /// The wire representation `[latitude, longitude, heading]` expected by
    /// the drive-command subsystem.
    pub fn as_wire(&self) -> [f64; 3] {
        [self.latitude, self.longitude, self.heading_or_default()]
    }
}

impl From<Fix> for FusedFix {
    fn from(fix: Fix) -> Self {
        FusedFix {
            latitude: fix.latitude,
            longitude: fix.longitude,
            heading: fix.heading,
        }
    }
}

/// Result of one fusion cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FusionOutput {
    /// A position that shall be published this cycle.
    Fix(FusedFix),
    /// No channel had a fix. Nothing is published and no position is fabricated.
    NoFix,
}

impl FusionOutput {
    pub fn fix(&self) -> Option<&FusedFix> {
        match self {
            FusionOutput::Fix(fix) => Some(fix),
            FusionOutput::NoFix => None,
        }
    }
}
