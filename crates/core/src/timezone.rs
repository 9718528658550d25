//! Timezone resolution and local-time rendering.
//!
//! Sessions store absolute UTC instants plus an IANA zone name used only for
//! rendering. The zone name never affects duration or overlap computation.
//! A name that does not resolve (old or buggy clients) is kept verbatim on
//! the record; rendering silently falls back to UTC.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

use crate::types::Timestamp;

/// Resolve an IANA zone name against the embedded timezone database.
///
/// Empty or unknown names resolve to `None`.
pub fn resolve_zone(name: &str) -> Option<Tz> {
    name.parse::<Tz>().ok()
}

/// Pick the zone name recorded on a new session.
///
/// Prefers a non-empty requested zone, then the owner's default, then UTC.
/// The chosen name is recorded as-is, whether or not it resolves.
pub fn resolve_session_zone(requested: Option<&str>, owner_default: &str) -> String {
    match requested {
        Some(req) if !req.is_empty() => req.to_string(),
        _ if !owner_default.is_empty() => owner_default.to_string(),
        _ => "UTC".to_string(),
    }
}

/// Render a UTC instant as wall-clock time in the named zone.
///
/// Falls back to UTC when the name is empty or unknown; never errors. The
/// instant itself is unchanged, so `to_local(end) - to_local(start)` always
/// equals `end - start` regardless of the zone or any DST transition inside
/// the interval.
pub fn to_local(instant: Timestamp, zone_name: &str) -> DateTime<FixedOffset> {
    match resolve_zone(zone_name) {
        Some(tz) => instant.with_timezone(&tz).fixed_offset(),
        None => instant.with_timezone(&Utc).fixed_offset(),
    }
}
