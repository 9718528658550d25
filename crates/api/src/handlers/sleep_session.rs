//! Handlers for the `/users/{user_id}/sleep-sessions` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use somna_core::error::CoreError;
use somna_core::pagination::{normalize_limit, Cursor};
use somna_core::types::DbId;
use somna_db::models::sleep_session::{
    CreateSleepSessionRequest, PaginationMeta, SessionFilter, SleepSessionListResponse,
    SleepSessionResponse, UpdateSleepSessionRequest,
};
use somna_db::repositories::{SleepSessionRepo, UserRepo};

use crate::engine::admission;
use crate::error::{AppError, AppResult};
use crate::query::ListSessionsParams;
use crate::state::AppState;

/// POST /api/v1/users/{user_id}/sleep-sessions
///
/// Returns 201 with the new session, or 200 with the previously created
/// session when `client_request_id` resolves to an idempotent replay.
pub async fn create(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<CreateSleepSessionRequest>,
) -> AppResult<(StatusCode, Json<SleepSessionResponse>)> {
    input.validate()?;

    let outcome = admission::create(&state.pool, user_id, &input).await?;
    let status = if outcome.was_existing() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome.into_session().into())))
}

/// GET /api/v1/users/{user_id}/sleep-sessions
///
/// Newest-first listing with optional `from`/`to` bounds on `start_at` and
/// cursor pagination.
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<ListSessionsParams>,
) -> AppResult<Json<SleepSessionListResponse>> {
    if !UserRepo::exists(&state.pool, user_id).await? {
        return Err(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }
        .into());
    }

    let cursor = match params.cursor.as_deref() {
        Some(encoded) => Cursor::decode(encoded)
            .map_err(|e| AppError::BadRequest(format!("invalid cursor: {e}")))?,
        None => None,
    };

    let limit = normalize_limit(params.limit);
    let filter = SessionFilter {
        from: params.from,
        to: params.to,
        limit,
        cursor,
    };

    let mut rows = SleepSessionRepo::list(&state.pool, user_id, &filter).await?;

    // One extra row was fetched to detect a following page.
    let has_more = rows.len() as i64 > limit;
    if has_more {
        rows.truncate(limit as usize);
    }

    let next_cursor = if has_more {
        rows.last()
            .map(|last| {
                Cursor {
                    id: last.id,
                    start_at: last.start_at,
                }
                .encode()
            })
            .unwrap_or_default()
    } else {
        String::new()
    };

    Ok(Json(SleepSessionListResponse {
        data: rows.into_iter().map(SleepSessionResponse::from).collect(),
        pagination: PaginationMeta {
            next_cursor,
            has_more,
        },
    }))
}

/// GET /api/v1/users/{user_id}/sleep-sessions/{id}
///
/// A session owned by a different user is reported as NotFound.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<SleepSessionResponse>> {
    let session = SleepSessionRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SleepSession",
            id,
        }))?;
    Ok(Json(session.into()))
}

/// PUT /api/v1/users/{user_id}/sleep-sessions/{id}
///
/// Partial update; omitted fields keep their prior values.
pub async fn update(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateSleepSessionRequest>,
) -> AppResult<Json<SleepSessionResponse>> {
    input.validate()?;

    let session = admission::update(&state.pool, user_id, id, &input).await?;
    Ok(Json(session.into()))
}
