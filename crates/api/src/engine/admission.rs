//! Create/update admission for sleep sessions.
//!
//! Both paths run entirely within one request: every rule violation is
//! detected synchronously and maps to exactly one `CoreError`. The
//! pre-checks give friendly errors on the common path; the schema
//! constraints (`uq_sleep_sessions_user_client_request`,
//! `uq_sleep_sessions_no_overlap`) arbitrate check-then-act races, and
//! their violations are translated here so a race loser is indistinguishable
//! from a pre-check hit.

use somna_core::error::CoreError;
use somna_core::overlap::{find_overlap, BookedInterval, Interval};
use somna_core::timezone::resolve_session_zone;
use somna_core::types::DbId;
use sqlx::PgPool;

use somna_db::models::sleep_session::{
    CreateSleepSessionRequest, NewSleepSession, SessionSpan, SleepSession,
    UpdateSleepSessionRequest,
};
use somna_db::repositories::{SleepSessionRepo, UserRepo};

use crate::error::{AppError, AppResult};

const OVERLAP_MESSAGE: &str = "Overlapping sleep session detected";

/// Successful outcome of a create request.
///
/// Callers must branch on the variant: an idempotent replay returns the
/// existing record unmodified and maps to 200 rather than 201.
#[derive(Debug)]
pub enum AdmissionOutcome {
    Created(SleepSession),
    AlreadyExisted(SleepSession),
}

impl AdmissionOutcome {
    pub fn was_existing(&self) -> bool {
        matches!(self, AdmissionOutcome::AlreadyExisted(_))
    }

    pub fn into_session(self) -> SleepSession {
        match self {
            AdmissionOutcome::Created(s) | AdmissionOutcome::AlreadyExisted(s) => s,
        }
    }
}

/// Admit a new sleep session for `user_id`.
pub async fn create(
    pool: &PgPool,
    user_id: DbId,
    req: &CreateSleepSessionRequest,
) -> AppResult<AdmissionOutcome> {
    // Owner must exist; the owner's zone is the rendering default.
    let user = UserRepo::find_by_id(pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    // Timestamps arrive as absolute instants (any offset) and are already
    // normalized to UTC by deserialization; only the ordering needs a check.
    if req.end_at <= req.start_at {
        return Err(CoreError::Validation("end_at must be after start_at".to_string()).into());
    }

    let local_timezone = resolve_session_zone(req.local_timezone.as_deref(), &user.timezone);
    let client_request_id = req
        .client_request_id
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    // Idempotent replay: return the original record untouched.
    if let Some(token) = client_request_id.as_deref() {
        if let Some(existing) =
            SleepSessionRepo::find_by_client_request_id(pool, user_id, token).await?
        {
            tracing::debug!(user_id = %user_id, token, "Idempotent replay resolved to existing session");
            return Ok(AdmissionOutcome::AlreadyExisted(existing));
        }
    }

    let candidate = Interval::new(req.start_at, req.end_at);
    if let Some(conflicting) = scan_for_overlap(pool, user_id, &candidate, None).await? {
        tracing::debug!(user_id = %user_id, conflicting = %conflicting, "Create rejected by overlap pre-check");
        return Err(CoreError::Conflict(OVERLAP_MESSAGE.to_string()).into());
    }

    let input = NewSleepSession {
        user_id,
        start_at: req.start_at,
        end_at: req.end_at,
        quality: req.quality,
        session_type: req.session_type,
        local_timezone,
        client_request_id,
    };

    match SleepSessionRepo::create(pool, &input).await {
        Ok(session) => Ok(AdmissionOutcome::Created(session)),
        Err(err) => match ConstraintViolation::of(&err) {
            // Two concurrent creates with the same token: the loser
            // re-resolves to the winner's row instead of erroring.
            Some(ConstraintViolation::IdempotencyKey) => {
                let Some(token) = input.client_request_id.as_deref() else {
                    return Err(err.into());
                };
                let existing = SleepSessionRepo::find_by_client_request_id(pool, user_id, token)
                    .await?
                    .ok_or(AppError::Database(err))?;
                Ok(AdmissionOutcome::AlreadyExisted(existing))
            }
            Some(ConstraintViolation::Overlap) => {
                Err(CoreError::Conflict(OVERLAP_MESSAGE.to_string()).into())
            }
            Some(ConstraintViolation::Check) => Err(CoreError::Validation(
                "end_at must be after start_at and quality must be in 1..=10".to_string(),
            )
            .into()),
            None => Err(err.into()),
        },
    }
}

/// Apply a partial edit to an existing session.
///
/// Omitted fields keep their prior values; an empty `local_timezone` string
/// means "no change". The `end_at > start_at` invariant and the overlap
/// policy are re-validated against the merged record.
pub async fn update(
    pool: &PgPool,
    user_id: DbId,
    session_id: DbId,
    req: &UpdateSleepSessionRequest,
) -> AppResult<SleepSession> {
    if !UserRepo::exists(pool, user_id).await? {
        return Err(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }
        .into());
    }

    let not_found = || CoreError::NotFound {
        entity: "SleepSession",
        id: session_id,
    };

    let mut session = SleepSessionRepo::find_by_id(pool, session_id)
        .await?
        .ok_or_else(not_found)?;

    // Ownership mismatches are reported as NotFound so one user cannot
    // probe for another user's session ids.
    if session.user_id != user_id {
        return Err(not_found().into());
    }

    if let Some(start_at) = req.start_at {
        session.start_at = start_at;
    }
    if let Some(end_at) = req.end_at {
        session.end_at = end_at;
    }
    if let Some(quality) = req.quality {
        session.quality = quality;
    }
    if let Some(session_type) = req.session_type {
        session.session_type = session_type;
    }
    if let Some(zone) = &req.local_timezone {
        if !zone.is_empty() {
            session.local_timezone = zone.clone();
        }
    }

    if session.end_at <= session.start_at {
        return Err(CoreError::Validation("end_at must be after start_at".to_string()).into());
    }

    let candidate = Interval::new(session.start_at, session.end_at);
    if let Some(conflicting) =
        scan_for_overlap(pool, user_id, &candidate, Some(session_id)).await?
    {
        tracing::debug!(user_id = %user_id, conflicting = %conflicting, "Update rejected by overlap pre-check");
        return Err(CoreError::Conflict(OVERLAP_MESSAGE.to_string()).into());
    }

    match SleepSessionRepo::update(pool, &session).await {
        Ok(Some(updated)) => Ok(updated),
        Ok(None) => Err(not_found().into()),
        Err(err) => match ConstraintViolation::of(&err) {
            Some(ConstraintViolation::Overlap) => {
                Err(CoreError::Conflict(OVERLAP_MESSAGE.to_string()).into())
            }
            Some(ConstraintViolation::Check) => Err(CoreError::Validation(
                "end_at must be after start_at and quality must be in 1..=10".to_string(),
            )
            .into()),
            _ => Err(err.into()),
        },
    }
}

/// Scan the owner's sessions for a conflict with `candidate`.
///
/// Per-user session counts stay small enough for a full scan; the
/// exclusion constraint backs this check under concurrency.
async fn scan_for_overlap(
    pool: &PgPool,
    user_id: DbId,
    candidate: &Interval,
    exclude: Option<DbId>,
) -> Result<Option<DbId>, sqlx::Error> {
    let spans = SleepSessionRepo::list_spans_for_owner(pool, user_id).await?;
    let booked: Vec<BookedInterval> = spans.iter().map(booked_interval).collect();
    Ok(find_overlap(&booked, candidate, exclude))
}

fn booked_interval(span: &SessionSpan) -> BookedInterval {
    BookedInterval {
        id: span.id,
        interval: Interval::new(span.start_at, span.end_at),
    }
}

/// The schema constraints whose violations the engine knows how to
/// translate.
enum ConstraintViolation {
    IdempotencyKey,
    Overlap,
    Check,
}

impl ConstraintViolation {
    fn of(err: &sqlx::Error) -> Option<Self> {
        let sqlx::Error::Database(db_err) = err else {
            return None;
        };
        match (db_err.code().as_deref(), db_err.constraint()) {
            (Some("23505"), Some("uq_sleep_sessions_user_client_request")) => {
                Some(Self::IdempotencyKey)
            }
            (Some("23P01"), Some("uq_sleep_sessions_no_overlap")) => Some(Self::Overlap),
            (Some("23514"), _) => Some(Self::Check),
            _ => None,
        }
    }
}
