//! Sleep analytics computed over already-admitted sessions.
//!
//! These are pure consumers of the admission engine's output: the caller
//! fetches sessions for a time window and hands them here as
//! [`SleepSample`]s. All wall-clock quantities (bedtime, mid-sleep, the day
//! a sleep belongs to) are derived in the session's own local zone with the
//! usual UTC fallback; durations are instant subtraction and therefore
//! zone-independent.

pub mod chronotype;
pub mod metrics;

use chrono::NaiveDate;

use crate::timezone::to_local;
use crate::types::Timestamp;

/// Sessions shorter than this are treated as noise and skipped.
pub const MIN_DURATION_MINUTES: i64 = 90;

/// The slice of a session the analytics need.
#[derive(Debug, Clone)]
pub struct SleepSample {
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub quality: i16,
    pub local_timezone: String,
}

/// A sample rendered into its local zone.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalView {
    pub duration_minutes: i64,
    /// Minutes after local midnight at which the session started.
    pub bedtime_minutes: i64,
    /// Minutes after local midnight of the session's midpoint.
    pub mid_sleep_minutes: i64,
    /// The local date of `end_at` -- the day the sleep "belongs to".
    pub local_date: NaiveDate,
}

pub(crate) fn local_view(sample: &SleepSample) -> LocalView {
    use chrono::Timelike;

    let start_local = to_local(sample.start_at, &sample.local_timezone);
    let end_local = to_local(sample.end_at, &sample.local_timezone);

    let duration_minutes = (sample.end_at - sample.start_at).num_minutes();
    let bedtime_minutes = i64::from(start_local.hour()) * 60 + i64::from(start_local.minute());

    let mid_local = start_local + chrono::Duration::minutes(duration_minutes / 2);
    let mid_sleep_minutes = i64::from(mid_local.hour()) * 60 + i64::from(mid_local.minute());

    LocalView {
        duration_minutes,
        bedtime_minutes,
        mid_sleep_minutes,
        local_date: end_local.date_naive(),
    }
}
