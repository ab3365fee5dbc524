//! Sentence dialects of the satellite receivers.
//!
//! Every dialect recognizes exactly one sentence type by its literal prefix and
//! extracts the coordinate tokens from fixed positions of the comma separated
//! record. A new receiver type is supported by adding a new [`SentenceDialect`]
//! implementation, the shared extraction in [`SentenceDialect::parse`] stays
//! untouched.

use std::{fmt, str::FromStr};
use thiserror::Error;

/// Coordinate tokens of one sentence before normalization.
///
/// The coordinate tokens are already sign adjusted, see [`flip_sign_marker`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFix {
    pub latitude: String,
    pub longitude: String,
    /// `None` if the sentence carries no heading field content.
    pub heading: Option<String>,
}

/// Reasons why a line does not yield a [`RawFix`].
///
/// None of these are exceptional on a noisy serial link, they all mean
/// "no fix from this line".
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SentenceError {
    #[error("not a {expected} sentence")]
    UnknownSentence { expected: &'static str },
    #[error("{found} fields, at least {required} required")]
    TooFewFields { found: usize, required: usize },
    #[error("no coordinate reported")]
    EmptyCoordinate,
}

/// Converts between the receiver's hemisphere marker and a numeric sign.
///
/// The receivers encode a negative coordinate with a leading `0`. The flip is
/// its own inverse: `"0740000"` becomes `"-740000"` and `"-740000"` becomes
/// `"0740000"`. Any other token is returned unchanged.
pub fn flip_sign_marker(token: &str) -> String {
    if let Some(rest) = token.strip_prefix('0') {
        format!("-{rest}")
    } else if let Some(rest) = token.strip_prefix('-') {
        format!("0{rest}")
    } else {
        token.to_owned()
    }
}

/// A sentence format understood by one receiver.
pub trait SentenceDialect: fmt::Debug + Send + Sync {
    /// The sentence id including the leading `$`, e.g. `$GPRMC`.
    fn prefix(&self) -> &'static str;

    /// Position of the latitude token, the sentence id is field 0.
    fn latitude_field(&self) -> usize;

    /// Position of the longitude token.
    fn longitude_field(&self) -> usize;

    /// Position of the heading (course over ground) token.
    fn heading_field(&self) -> usize;

    /// Records with fewer fields are malformed.
    fn min_fields(&self) -> usize {
        self.latitude_field()
            .max(self.longitude_field())
            .max(self.heading_field())
            + 1
    }

    /// Extracts the coordinate tokens from one line of telemetry.
    fn parse(&self, line: &str) -> Result<RawFix, SentenceError> {
        let line = line.trim();
        let fields: Vec<&str> = line.split(',').collect();
        if fields[0] != self.prefix() {
            return Err(SentenceError::UnknownSentence {
                expected: self.prefix(),
            });
        }
        if fields.len() < self.min_fields() {
            return Err(SentenceError::TooFewFields {
                found: fields.len(),
                required: self.min_fields(),
            });
        }
        let latitude = fields[self.latitude_field()].trim();
        let longitude = fields[self.longitude_field()].trim();
        if latitude.is_empty() || longitude.is_empty() {
            return Err(SentenceError::EmptyCoordinate);
        }
        let heading = fields[self.heading_field()].trim();
        Ok(RawFix {
            latitude: sign_adjusted(latitude),
            longitude: sign_adjusted(longitude),
            heading: (!heading.is_empty()).then(|| heading.to_owned()),
        })
    }
}

fn sign_adjusted(token: &str) -> String {
    if token.starts_with('0') {
        flip_sign_marker(token)
    } else {
        token.to_owned()
    }
}

/// The recommended minimum sentence (RMC) of a given talker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rmc {
    prefix: &'static str,
}

/// RMC sentences of a GPS only receiver.
pub const GPRMC: Rmc = Rmc { prefix: "$GPRMC" };

/// RMC sentences of a multi constellation receiver.
pub const GNRMC: Rmc = Rmc { prefix: "$GNRMC" };

impl SentenceDialect for Rmc {
    fn prefix(&self) -> &'static str {
        self.prefix
    }

    fn latitude_field(&self) -> usize {
        3
    }

    fn longitude_field(&self) -> usize {
        5
    }

    fn heading_field(&self) -> usize {
        8
    }
}

/// The dialects that can be assigned to a channel at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialectKind {
    Gprmc,
    Gnrmc,
}

impl DialectKind {
    pub fn dialect(&self) -> Box<dyn SentenceDialect> {
        match self {
            DialectKind::Gprmc => Box::new(GPRMC),
            DialectKind::Gnrmc => Box::new(GNRMC),
        }
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('$').to_ascii_lowercase().as_str() {
            "gprmc" => Ok(DialectKind::Gprmc),
            "gnrmc" => Ok(DialectKind::Gnrmc),
            other => Err(format!(
                "unknown dialect \"{other}\", expected gprmc or gnrmc"
            )),
        }
    }
}
