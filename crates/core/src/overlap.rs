//! Overlap detection for sleep intervals.
//!
//! Two sessions overlap when their `[start, end)` intervals intersect:
//! `a.start < b.end AND a.end > b.start`. Sessions that merely touch at an
//! endpoint do not overlap. The policy is type-agnostic: CORE and NAP
//! sessions are all mutually exclusive for the same user.
//!
//! The scan here is the request-time pre-check; the database exclusion
//! constraint on `(user_id, tstzrange(start_at, end_at))` is the final
//! arbiter under concurrent writes.

use crate::types::{DbId, Timestamp};

/// A half-open `[start, end)` time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Interval {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Half-open intersection test. Symmetric.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// An existing session's interval, as seen by the overlap scan.
#[derive(Debug, Clone, Copy)]
pub struct BookedInterval {
    pub id: DbId,
    pub interval: Interval,
}

/// Scan a user's existing sessions for one that conflicts with `candidate`.
///
/// `exclude` skips the session being updated so it does not conflict with
/// itself. Returns the id of the first conflicting session, if any.
pub fn find_overlap(
    existing: &[BookedInterval],
    candidate: &Interval,
    exclude: Option<DbId>,
) -> Option<DbId> {
    existing
        .iter()
        .filter(|s| Some(s.id) != exclude)
        .find(|s| s.interval.overlaps(candidate))
        .map(|s| s.id)
}
