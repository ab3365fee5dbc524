use crate::nmea::RawFix;
use chrono::{DateTime, Utc};
use common::{error::NavError, position::Fix};

/// The coordinate a token encodes. Decides the width of the degree part of
/// tokens without a decimal point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn degree_digits(&self) -> usize {
        match self {
            Axis::Latitude => 2,
            Axis::Longitude => 3,
        }
    }
}

/// Converts a signed degrees+minutes token into decimal degrees.
///
/// `decimal = sign * (whole_degrees + minutes / 60)`
///
/// Two layouts are accepted:
/// - `ddmm.mmmm` / `dddmm.mmmm`: all integer digits except the last two are
///   degrees, the rest are minutes.
/// - compact tokens without a decimal point: the first two (latitude) or three
///   (longitude) digits are degrees, the following two digits whole minutes and
///   the remaining digits decimal minutes. `"-740000"` is `-74.0`.
///
/// # Errors
///
/// [`NavError::MalformedToken`] if the token is not a number of this layout or
/// carries 60 or more minutes.
pub fn to_decimal_degrees(token: &str, axis: Axis) -> Result<f64, NavError> {
    let malformed = |reason| NavError::MalformedToken {
        token: token.to_owned(),
        reason,
    };
    let (sign, body) = match token.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, token.strip_prefix('+').unwrap_or(token)),
    };
    let (integer, fraction) = match body.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (body, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if integer.is_empty() || !all_digits(integer) || !fraction.is_none_or(all_digits) {
        return Err(malformed("not a degrees+minutes number"));
    }

    let (degrees, minutes) = match fraction {
        Some(fraction) => {
            if integer.len() < 2 {
                return Err(malformed("missing whole minutes"));
            }
            let split = integer.len() - 2;
            (&integer[..split], format!("{}.{fraction}", &integer[split..]))
        }
        None => {
            let digits = axis.degree_digits();
            if integer.len() < digits + 2 {
                return Err(malformed("too few digits"));
            }
            (
                &integer[..digits],
                format!("{}.{}", &integer[digits..digits + 2], &integer[digits + 2..]),
            )
        }
    };
    let whole: f64 = if degrees.is_empty() {
        0.0
    } else {
        degrees
            .parse()
            .map_err(|_| malformed("not a degrees+minutes number"))?
    };
    let minutes: f64 = minutes
        .parse()
        .map_err(|_| malformed("not a degrees+minutes number"))?;
    if minutes >= 60.0 {
        return Err(malformed("minutes out of range"));
    }
    Ok(sign * (whole + minutes / 60.0))
}

/// Decodes the heading token, an empty or missing token is no heading.
pub fn parse_heading(token: Option<&str>) -> Result<Option<f64>, NavError> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    token
        .parse::<f64>()
        .map(Some)
        .map_err(|_| NavError::MalformedToken {
            token: token.to_owned(),
            reason: "heading is not a number",
        })
}

/// Builds a validated [`Fix`] from the tokens of one sentence.
///
/// # Errors
///
/// * [`NavError::MalformedToken`] if a token can't be decoded.
/// * [`NavError::OutOfRangeCoordinate`] if the decoded position is outside of
///   the WGS84 range.
pub fn normalize(raw: &RawFix, observed_at: DateTime<Utc>) -> Result<Fix, NavError> {
    let latitude = to_decimal_degrees(&raw.latitude, Axis::Latitude)?;
    let longitude = to_decimal_degrees(&raw.longitude, Axis::Longitude)?;
    let heading = parse_heading(raw.heading.as_deref())?;
    Fix::new(latitude, longitude, heading, observed_at)
}
