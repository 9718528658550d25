//! Handlers for the `/users/{user_id}/sleep` analytics endpoints.
//!
//! Pure consumers of admitted sessions: fetch the window by `end_at`, hand
//! the rows to `somna_core::analytics`, serialize the result.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Serialize;

use somna_core::analytics::chronotype::{self, ChronotypeResult};
use somna_core::analytics::metrics::{
    self, DailyOverallMetrics, DerivedScores, PerSleepMetrics, WindowMetrics,
};
use somna_core::analytics::SleepSample;
use somna_core::error::CoreError;
use somna_core::types::{DbId, Timestamp};
use somna_db::models::sleep_session::SleepSession;
use somna_db::repositories::{SleepSessionRepo, UserRepo};

use crate::error::AppResult;
use crate::query::AnalyticsWindowParams;
use crate::state::AppState;

/// Metrics response: window bounds plus the computed blocks.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub window: Window,
    pub per_sleep: PerSleepMetrics,
    pub daily_overall: DailyOverallMetrics,
    pub scores: DerivedScores,
}

#[derive(Debug, Serialize)]
pub struct Window {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl From<WindowMetrics> for MetricsResponse {
    fn from(m: WindowMetrics) -> Self {
        Self {
            window: Window {
                from: m.from,
                to: m.to,
            },
            per_sleep: m.per_sleep,
            daily_overall: m.daily_overall,
            scores: m.scores,
        }
    }
}

/// GET /api/v1/users/{user_id}/sleep/chronotype
pub async fn get_chronotype(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<AnalyticsWindowParams>,
) -> AppResult<Json<ChronotypeResult>> {
    ensure_user_exists(&state, user_id).await?;

    let window_days = positive_or(params.window_days, chronotype::DEFAULT_WINDOW_DAYS);
    let min_sleeps = match params.min_sleeps {
        Some(n) if n > 0 => n as usize,
        _ => chronotype::DEFAULT_MIN_SLEEPS,
    };

    let (samples, _, _) = fetch_window(&state, user_id, window_days).await?;
    Ok(Json(chronotype::compute(&samples, window_days, min_sleeps)))
}

/// GET /api/v1/users/{user_id}/sleep/metrics
pub async fn get_metrics(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<AnalyticsWindowParams>,
) -> AppResult<Json<MetricsResponse>> {
    ensure_user_exists(&state, user_id).await?;

    let window_days = positive_or(params.window_days, metrics::DEFAULT_WINDOW_DAYS);
    let (samples, from, to) = fetch_window(&state, user_id, window_days).await?;

    Ok(Json(metrics::compute_window(&samples, from, to).into()))
}

async fn ensure_user_exists(state: &AppState, user_id: DbId) -> AppResult<()> {
    if UserRepo::exists(&state.pool, user_id).await? {
        Ok(())
    } else {
        Err(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }
        .into())
    }
}

/// Fetch the sessions ending in the last `window_days` days, as samples,
/// along with the window bounds used.
async fn fetch_window(
    state: &AppState,
    user_id: DbId,
    window_days: i64,
) -> AppResult<(Vec<SleepSample>, Timestamp, Timestamp)> {
    let to = Utc::now();
    let from = to - Duration::days(window_days);
    let rows = SleepSessionRepo::list_by_end_range(&state.pool, user_id, from, to).await?;
    Ok((rows.into_iter().map(sample_from).collect(), from, to))
}

fn positive_or(value: Option<i64>, default: i64) -> i64 {
    match value {
        Some(v) if v > 0 => v,
        _ => default,
    }
}

fn sample_from(session: SleepSession) -> SleepSample {
    SleepSample {
        start_at: session.start_at,
        end_at: session.end_at,
        quality: session.quality,
        local_timezone: session.local_timezone,
    }
}
