//! Route definitions for the `/users` resource.
//!
//! Sleep sessions and analytics are nested under their owning user.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{analytics, sleep_session, user};
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST   /                                    -> create
/// GET    /{user_id}                           -> get_by_id
/// DELETE /{user_id}                           -> delete (cascades to sessions)
///
/// POST   /{user_id}/sleep-sessions            -> create (201; 200 on replay)
/// GET    /{user_id}/sleep-sessions            -> list (from/to/limit/cursor)
/// GET    /{user_id}/sleep-sessions/{id}       -> get_by_id
/// PUT    /{user_id}/sleep-sessions/{id}       -> update (partial)
///
/// GET    /{user_id}/sleep/chronotype          -> chronotype classification
/// GET    /{user_id}/sleep/metrics             -> rolling sleep metrics
/// ```
pub fn router() -> Router<AppState> {
    let session_routes = Router::new()
        .route("/", post(sleep_session::create).get(sleep_session::list))
        .route(
            "/{id}",
            get(sleep_session::get_by_id).put(sleep_session::update),
        );

    let analytics_routes = Router::new()
        .route("/chronotype", get(analytics::get_chronotype))
        .route("/metrics", get(analytics::get_metrics));

    Router::new()
        .route("/", post(user::create))
        .route("/{user_id}", get(user::get_by_id).delete(user::delete))
        .nest("/{user_id}/sleep-sessions", session_routes)
        .nest("/{user_id}/sleep", analytics_routes)
}
