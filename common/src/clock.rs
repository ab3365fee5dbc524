use chrono::{DateTime, Utc};

/// A source of wall clock time used to stamp fixes with their observation time.
///
/// Implementations must be shareable between the channel tasks, so the trait
/// requires `Send + Sync`.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// A [`Clock`] backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
