//! Handlers for the `/users` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use somna_core::error::CoreError;
use somna_core::timezone::resolve_zone;
use somna_core::types::DbId;
use somna_db::models::user::{CreateUser, UserResponse};
use somna_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/users
///
/// The timezone must resolve to a known IANA zone; it becomes the default
/// rendering zone for the user's sessions.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    input.validate()?;
    if resolve_zone(&input.timezone).is_none() {
        return Err(CoreError::Validation(format!(
            "unknown timezone: {}",
            input.timezone
        ))
        .into());
    }

    let user = UserRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/{user_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/{user_id}
///
/// Cascade-deletes the user's sleep sessions.
pub async fn delete(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = UserRepo::delete(&state.pool, user_id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))
    }
}
