//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for connection bookkeeping.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole seconds elapsed between `since` and `at`, saturating at zero when
/// the clock went backwards.
#[must_use]
pub fn seconds_between(since: Timestamp, at: Timestamp) -> u64 {
    u64::try_from((at - since).num_seconds()).unwrap_or(0)
}
