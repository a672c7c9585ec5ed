//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};

/// UTC timestamp used for `created_at` and statistics windows.
pub type Timestamp = DateTime<Utc>;

/// Length of the trailing window counted by `new_this_week`.
pub const NEW_PATIENT_WINDOW_DAYS: i64 = 7;

/// Return the current UTC time truncated to the stored precision.
///
/// `created_at` is persisted with microsecond precision; truncating here keeps
/// the value handed back to callers identical to the stored one.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp the way it is stored.
///
/// Fixed width with a `Z` suffix, so string order equals chronological order.
#[must_use]
pub fn to_storage_string(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Lower bound (inclusive) of the trailing new-patient window ending at `at`.
#[must_use]
pub fn week_before(at: Timestamp) -> Timestamp {
    at - TimeDelta::days(NEW_PATIENT_WINDOW_DAYS)
}
