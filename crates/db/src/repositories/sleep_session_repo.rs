//! Repository for the `sleep_sessions` table.

use somna_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::sleep_session::{NewSleepSession, SessionFilter, SessionSpan, SleepSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, start_at, end_at, quality, session_type, \
                        local_timezone, client_request_id, created_at";

/// Provides CRUD operations for sleep sessions.
pub struct SleepSessionRepo;

impl SleepSessionRepo {
    /// Insert a new session, returning the created row.
    ///
    /// Constraint violations (overlap exclusion, idempotency uniqueness,
    /// checks) surface as `sqlx::Error::Database`; classification is the
    /// admission engine's job.
    pub async fn create(
        pool: &PgPool,
        input: &NewSleepSession,
    ) -> Result<SleepSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO sleep_sessions
                 (user_id, start_at, end_at, quality, session_type, local_timezone, client_request_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SleepSession>(&query)
            .bind(input.user_id)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(input.quality)
            .bind(input.session_type)
            .bind(&input.local_timezone)
            .bind(&input.client_request_id)
            .fetch_one(pool)
            .await
    }

    /// Find a session by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SleepSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sleep_sessions WHERE id = $1");
        sqlx::query_as::<_, SleepSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up the session previously created for a `(user, token)` pair.
    ///
    /// Absence is not an error here; it simply means the request is a
    /// first occurrence.
    pub async fn find_by_client_request_id(
        pool: &PgPool,
        user_id: DbId,
        client_request_id: &str,
    ) -> Result<Option<SleepSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sleep_sessions
             WHERE user_id = $1 AND client_request_id = $2"
        );
        sqlx::query_as::<_, SleepSession>(&query)
            .bind(user_id)
            .bind(client_request_id)
            .fetch_optional(pool)
            .await
    }

    /// All of a user's session intervals, for the overlap pre-check scan.
    pub async fn list_spans_for_owner(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<SessionSpan>, sqlx::Error> {
        sqlx::query_as::<_, SessionSpan>(
            "SELECT id, start_at, end_at FROM sleep_sessions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// List a user's sessions newest-first with date filters and cursor
    /// pagination.
    ///
    /// Fetches `limit + 1` rows so the caller can detect whether more
    /// results exist beyond the page. Ordering is `start_at DESC, id DESC`;
    /// the cursor predicate matches that total order so pages stay stable
    /// when sessions share a `start_at`.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &SessionFilter,
    ) -> Result<Vec<SleepSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sleep_sessions
             WHERE user_id = $1
               AND ($2::timestamptz IS NULL OR start_at >= $2)
               AND ($3::timestamptz IS NULL OR start_at <= $3)
               AND ($4::timestamptz IS NULL
                    OR start_at < $4
                    OR (start_at = $4 AND id < $5))
             ORDER BY start_at DESC, id DESC
             LIMIT $6"
        );
        let (cursor_start, cursor_id) = match &filter.cursor {
            Some(c) => (Some(c.start_at), Some(c.id)),
            None => (None, None),
        };
        sqlx::query_as::<_, SleepSession>(&query)
            .bind(user_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(cursor_start)
            .bind(cursor_id)
            .bind(filter.limit + 1)
            .fetch_all(pool)
            .await
    }

    /// Sessions whose `end_at` falls in `[from, to]`, oldest first.
    ///
    /// The analytics window is keyed on `end_at`: a night ending inside the
    /// window belongs to it even when it started before.
    pub async fn list_by_end_range(
        pool: &PgPool,
        user_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<SleepSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sleep_sessions
             WHERE user_id = $1 AND end_at >= $2 AND end_at <= $3
             ORDER BY end_at ASC"
        );
        sqlx::query_as::<_, SleepSession>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Write back a session whose mutable fields were merged in memory by
    /// the admission engine. Returns `None` if the row vanished.
    pub async fn update(
        pool: &PgPool,
        session: &SleepSession,
    ) -> Result<Option<SleepSession>, sqlx::Error> {
        let query = format!(
            "UPDATE sleep_sessions SET
                start_at = $2,
                end_at = $3,
                quality = $4,
                session_type = $5,
                local_timezone = $6
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SleepSession>(&query)
            .bind(session.id)
            .bind(session.start_at)
            .bind(session.end_at)
            .bind(session.quality)
            .bind(session.session_type)
            .bind(&session.local_timezone)
            .fetch_optional(pool)
            .await
    }
}
