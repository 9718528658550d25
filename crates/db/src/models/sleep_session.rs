//! Sleep session entity model and DTOs.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use somna_core::pagination::Cursor;
use somna_core::timezone::to_local;
use somna_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::Validate;

/// Category of a sleep session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
pub enum SleepType {
    /// Primary overnight sleep.
    Core,
    /// Secondary, typically daytime, sleep.
    Nap,
}

/// A sleep session row from the `sleep_sessions` table.
///
/// `start_at`/`end_at` are UTC instants; `local_timezone` is presentation
/// metadata only and may hold a name that no longer resolves.
#[derive(Debug, Clone, FromRow)]
pub struct SleepSession {
    pub id: DbId,
    pub user_id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub quality: i16,
    pub session_type: SleepType,
    pub local_timezone: String,
    pub client_request_id: Option<String>,
    pub created_at: Timestamp,
}

/// Insert DTO produced by the admission engine after normalization.
#[derive(Debug, Clone)]
pub struct NewSleepSession {
    pub user_id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub quality: i16,
    pub session_type: SleepType,
    pub local_timezone: String,
    pub client_request_id: Option<String>,
}

/// Request body for recording a sleep session.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSleepSessionRequest {
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    #[validate(range(min = 1, max = 10))]
    pub quality: i16,
    #[serde(rename = "type")]
    pub session_type: SleepType,
    /// Client-generated token making this create safe to retry.
    #[validate(length(max = 255))]
    pub client_request_id: Option<String>,
    /// IANA zone for local rendering; defaults to the owner's timezone.
    #[validate(length(max = 64))]
    pub local_timezone: Option<String>,
}

/// Request body for editing a sleep session. Omitted fields keep their
/// prior values; an empty `local_timezone` string also means "no change".
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSleepSessionRequest {
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    #[validate(range(min = 1, max = 10))]
    pub quality: Option<i16>,
    #[serde(rename = "type")]
    pub session_type: Option<SleepType>,
    #[validate(length(max = 64))]
    pub local_timezone: Option<String>,
}

/// Sleep session representation for API responses, with both UTC and
/// locally rendered times.
#[derive(Debug, Clone, Serialize)]
pub struct SleepSessionResponse {
    pub id: DbId,
    pub user_id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub quality: i16,
    #[serde(rename = "type")]
    pub session_type: SleepType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_request_id: Option<String>,
    pub created_at: Timestamp,
    /// Echoed verbatim, even when it does not resolve.
    pub local_timezone: String,
    pub local_start_at: DateTime<FixedOffset>,
    pub local_end_at: DateTime<FixedOffset>,
}

impl From<SleepSession> for SleepSessionResponse {
    fn from(session: SleepSession) -> Self {
        let local_start_at = to_local(session.start_at, &session.local_timezone);
        let local_end_at = to_local(session.end_at, &session.local_timezone);
        Self {
            id: session.id,
            user_id: session.user_id,
            start_at: session.start_at,
            end_at: session.end_at,
            quality: session.quality,
            session_type: session.session_type,
            client_request_id: session.client_request_id,
            created_at: session.created_at,
            local_timezone: session.local_timezone,
            local_start_at,
            local_end_at,
        }
    }
}

/// Paginated listing envelope.
#[derive(Debug, Serialize)]
pub struct SleepSessionListResponse {
    pub data: Vec<SleepSessionResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub next_cursor: String,
    pub has_more: bool,
}

/// Resolved filter for a listing query. `limit` is already clamped.
#[derive(Debug, Default, Clone)]
pub struct SessionFilter {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: i64,
    pub cursor: Option<Cursor>,
}

/// Just the interval of an existing session, for the overlap scan.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct SessionSpan {
    pub id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
}
