//! Shared query parameter types for API handlers.

use serde::Deserialize;
use somna_core::types::Timestamp;

/// Query parameters for the session listing endpoint
/// (`?from=&to=&limit=&cursor=`).
///
/// `limit` is clamped in the handler via `normalize_limit`; `cursor` is an
/// opaque token from a previous response.
#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsParams {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

/// Query parameters for the analytics endpoints
/// (`?window_days=&min_sleeps=`).
///
/// Absent or non-positive values fall back to the per-endpoint defaults.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsWindowParams {
    pub window_days: Option<i64>,
    pub min_sleeps: Option<i64>,
}
