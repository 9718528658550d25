//! HTTP-level integration tests for the sleep session endpoints: admission
//! (overlap + idempotency), local-time rendering, partial updates, and
//! cursor pagination.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, put_json};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_user(pool: &PgPool, timezone: &str) -> String {
    let app = common::build_test_app(pool.clone());
    let json = body_json(
        post_json(
            app,
            "/api/v1/users",
            serde_json::json!({ "timezone": timezone }),
        )
        .await,
    )
    .await;
    json["id"].as_str().unwrap().to_string()
}

fn core_session(start: &str, end: &str) -> serde_json::Value {
    serde_json::json!({
        "start_at": start,
        "end_at": end,
        "quality": 8,
        "type": "CORE"
    })
}

async fn post_session(
    pool: &PgPool,
    user_id: &str,
    body: serde_json::Value,
) -> axum::response::Response {
    let app = common::build_test_app(pool.clone());
    post_json(
        app,
        &format!("/api/v1/users/{user_id}/sleep-sessions"),
        body,
    )
    .await
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_stores_utc_and_renders_owner_zone(pool: PgPool) {
    let user_id = create_user(&pool, "Europe/Prague").await;
    let response = post_session(
        &pool,
        &user_id,
        core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    // Stored instants unchanged.
    assert_eq!(json["start_at"], "2024-01-15T23:00:00Z");
    assert_eq!(json["end_at"], "2024-01-16T07:00:00Z");
    // Local rendering follows the owner's zone.
    assert_eq!(json["local_timezone"], "Europe/Prague");
    assert_eq!(json["local_start_at"], "2024-01-16T00:00:00+01:00");
    assert_eq!(json["local_end_at"], "2024-01-16T08:00:00+01:00");
    assert_eq!(json["type"], "CORE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_accepts_offset_timestamps(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    // +01:00 offsets normalize to the same instants as the Z form.
    let response = post_session(
        &pool,
        &user_id,
        core_session("2024-01-16T00:00:00+01:00", "2024-01-16T08:00:00+01:00"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["start_at"], "2024-01-15T23:00:00Z");
    assert_eq!(json["end_at"], "2024-01-16T07:00:00Z");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn explicit_zone_overrides_owner_default(pool: PgPool) {
    let user_id = create_user(&pool, "Europe/Prague").await;
    let mut body = core_session("2024-03-10T09:30:00Z", "2024-03-10T10:30:00Z");
    body["local_timezone"] = serde_json::json!("America/Los_Angeles");
    let json = body_json(post_session(&pool, &user_id, body).await).await;

    // US spring-forward night: wall clock reads 01:30 -> 03:30 but the
    // elapsed duration is exactly one hour in both renderings.
    assert_eq!(json["local_timezone"], "America/Los_Angeles");
    assert_eq!(json["local_start_at"], "2024-03-10T01:30:00-08:00");
    assert_eq!(json["local_end_at"], "2024-03-10T03:30:00-07:00");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unresolvable_zone_is_stored_and_rendered_as_utc(pool: PgPool) {
    let user_id = create_user(&pool, "Europe/Prague").await;
    let mut body = core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z");
    body["local_timezone"] = serde_json::json!("Mars/Olympus_Mons");
    let json = body_json(post_session(&pool, &user_id, body).await).await;

    // The garbage name is echoed unchanged; rendering falls back to UTC.
    assert_eq!(json["local_timezone"], "Mars/Olympus_Mons");
    assert_eq!(json["local_start_at"], "2024-01-15T23:00:00+00:00");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_for_unknown_user_returns_404(pool: PgPool) {
    let user_id = uuid::Uuid::new_v4().to_string();
    let response = post_session(
        &pool,
        &user_id,
        core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn quality_out_of_range_returns_400(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    let mut body = core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z");
    body["quality"] = serde_json::json!(11);
    let response = post_session(&pool, &user_id, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inverted_interval_returns_400(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    let response = post_session(
        &pool,
        &user_id,
        core_session("2024-01-16T07:00:00Z", "2024-01-15T23:00:00Z"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Overlap policy
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn overlapping_session_returns_409(pool: PgPool) {
    let user_id = create_user(&pool, "Europe/Prague").await;
    post_session(
        &pool,
        &user_id,
        core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
    )
    .await;

    let response = post_session(
        &pool,
        &user_id,
        core_session("2024-01-15T22:00:00Z", "2024-01-16T06:00:00Z"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn naps_may_not_overlap_naps_either(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    let mut nap = core_session("2024-01-15T13:00:00Z", "2024-01-15T15:00:00Z");
    nap["type"] = serde_json::json!("NAP");
    post_session(&pool, &user_id, nap.clone()).await;

    let mut second = core_session("2024-01-15T14:00:00Z", "2024-01-15T16:00:00Z");
    second["type"] = serde_json::json!("NAP");
    let response = post_session(&pool, &user_id, second).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn touching_sessions_are_admitted(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    post_session(
        &pool,
        &user_id,
        core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
    )
    .await;

    let mut nap = core_session("2024-01-16T07:00:00Z", "2024-01-16T08:30:00Z");
    nap["type"] = serde_json::json!("NAP");
    let response = post_session(&pool, &user_id, nap).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn different_users_may_overlap(pool: PgPool) {
    let alice = create_user(&pool, "UTC").await;
    let bob = create_user(&pool, "UTC").await;
    let body = core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z");

    assert_eq!(
        post_session(&pool, &alice, body.clone()).await.status(),
        StatusCode::CREATED
    );
    assert_eq!(
        post_session(&pool, &bob, body).await.status(),
        StatusCode::CREATED
    );
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn identical_replay_returns_existing_session(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    let mut body = core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z");
    body["client_request_id"] = serde_json::json!("req-123");

    let first = post_session(&pool, &user_id, body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first_json = body_json(first).await;

    let second = post_session(&pool, &user_id, body).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second_json = body_json(second).await;

    assert_eq!(first_json["id"], second_json["id"]);
    assert_eq!(second_json["client_request_id"], "req-123");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn replay_returns_original_record_unmodified(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    let mut body = core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z");
    body["client_request_id"] = serde_json::json!("req-123");
    let original = body_json(post_session(&pool, &user_id, body).await).await;

    // Replay with a different payload: the stored record wins.
    let mut replay = core_session("2024-02-01T23:00:00Z", "2024-02-02T07:00:00Z");
    replay["client_request_id"] = serde_json::json!("req-123");
    replay["quality"] = serde_json::json!(3);
    let response = post_session(&pool, &user_id, replay).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], original["id"]);
    assert_eq!(json["start_at"], "2024-01-15T23:00:00Z");
    assert_eq!(json["quality"], 8);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn same_token_different_users_are_independent(pool: PgPool) {
    let alice = create_user(&pool, "UTC").await;
    let bob = create_user(&pool, "UTC").await;
    let mut body = core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z");
    body["client_request_id"] = serde_json::json!("shared-token");

    let alice_resp = post_session(&pool, &alice, body.clone()).await;
    assert_eq!(alice_resp.status(), StatusCode::CREATED);
    let alice_json = body_json(alice_resp).await;

    let bob_resp = post_session(&pool, &bob, body).await;
    assert_eq!(bob_resp.status(), StatusCode::CREATED);
    let bob_json = body_json(bob_resp).await;

    assert_ne!(alice_json["id"], bob_json["id"]);
}

// ---------------------------------------------------------------------------
// Get / update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_session_of_other_user_returns_404(pool: PgPool) {
    let alice = create_user(&pool, "UTC").await;
    let bob = create_user(&pool, "UTC").await;
    let session = body_json(
        post_session(
            &pool,
            &alice,
            core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
        )
        .await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/users/{bob}/sleep-sessions/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_applies_only_present_fields(pool: PgPool) {
    let user_id = create_user(&pool, "Europe/Prague").await;
    let session = body_json(
        post_session(
            &pool,
            &user_id,
            core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
        )
        .await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/v1/users/{user_id}/sleep-sessions/{id}"),
        serde_json::json!({ "quality": 9 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["quality"], 9);
    // Everything else kept its prior value.
    assert_eq!(json["start_at"], "2024-01-15T23:00:00Z");
    assert_eq!(json["end_at"], "2024-01-16T07:00:00Z");
    assert_eq!(json["type"], "CORE");
    assert_eq!(json["local_timezone"], "Europe/Prague");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_empty_timezone_means_no_change(pool: PgPool) {
    let user_id = create_user(&pool, "Europe/Prague").await;
    let session = body_json(
        post_session(
            &pool,
            &user_id,
            core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
        )
        .await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let json = body_json(
        put_json(
            app,
            &format!("/api/v1/users/{user_id}/sleep-sessions/{id}"),
            serde_json::json!({ "local_timezone": "", "quality": 5 }),
        )
        .await,
    )
    .await;
    assert_eq!(json["local_timezone"], "Europe/Prague");
    assert_eq!(json["quality"], 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_rechecks_interval_invariant_after_merge(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    let session = body_json(
        post_session(
            &pool,
            &user_id,
            core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
        )
        .await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    // end_at moved before the unchanged start_at: rejected even though the
    // request also edits other fields.
    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/v1/users/{user_id}/sleep-sessions/{id}"),
        serde_json::json!({ "end_at": "2024-01-15T22:00:00Z", "quality": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The record is unchanged.
    let app = common::build_test_app(pool.clone());
    let json = body_json(
        get(app, &format!("/api/v1/users/{user_id}/sleep-sessions/{id}")).await,
    )
    .await;
    assert_eq!(json["end_at"], "2024-01-16T07:00:00Z");
    assert_eq!(json["quality"], 8);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_may_not_create_overlap(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    post_session(
        &pool,
        &user_id,
        core_session("2024-01-15T20:00:00Z", "2024-01-15T22:00:00Z"),
    )
    .await;
    let second = body_json(
        post_session(
            &pool,
            &user_id,
            core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
        )
        .await,
    )
    .await;
    let id = second["id"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/v1/users/{user_id}/sleep-sessions/{id}"),
        serde_json::json!({ "start_at": "2024-01-15T21:00:00Z" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_excludes_itself_from_overlap_check(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    let session = body_json(
        post_session(
            &pool,
            &user_id,
            core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
        )
        .await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    // Extending a session overlaps its own old interval; that must not
    // count as a conflict.
    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/v1/users/{user_id}/sleep-sessions/{id}"),
        serde_json::json!({ "end_at": "2024-01-16T08:00:00Z" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_of_other_users_session_returns_404(pool: PgPool) {
    let alice = create_user(&pool, "UTC").await;
    let bob = create_user(&pool, "UTC").await;
    let session = body_json(
        post_session(
            &pool,
            &alice,
            core_session("2024-01-15T23:00:00Z", "2024-01-16T07:00:00Z"),
        )
        .await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/v1/users/{bob}/sleep-sessions/{id}"),
        serde_json::json!({ "quality": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_paginates_25_sessions_into_two_pages(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    for day in 1..=25 {
        let response = post_session(
            &pool,
            &user_id,
            core_session(
                &format!("2024-01-{day:02}T22:00:00Z"),
                &format!("2024-01-{day:02}T23:30:00Z"),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let app = common::build_test_app(pool.clone());
    let first = body_json(
        get(app, &format!("/api/v1/users/{user_id}/sleep-sessions")).await,
    )
    .await;
    assert_eq!(first["data"].as_array().unwrap().len(), 20);
    assert_eq!(first["pagination"]["has_more"], true);
    let cursor = first["pagination"]["next_cursor"].as_str().unwrap();
    assert!(!cursor.is_empty());
    // Newest first.
    assert_eq!(first["data"][0]["start_at"], "2024-01-25T22:00:00Z");

    let app = common::build_test_app(pool.clone());
    let second = body_json(
        get(
            app,
            &format!("/api/v1/users/{user_id}/sleep-sessions?cursor={cursor}"),
        )
        .await,
    )
    .await;
    assert_eq!(second["data"].as_array().unwrap().len(), 5);
    assert_eq!(second["pagination"]["has_more"], false);
    assert_eq!(second["data"][4]["start_at"], "2024-01-01T22:00:00Z");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_with_garbage_cursor_returns_400(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    let app = common::build_test_app(pool.clone());
    let response = get(
        app,
        &format!("/api/v1/users/{user_id}/sleep-sessions?cursor=!!!not-a-cursor"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_applies_date_filters(pool: PgPool) {
    let user_id = create_user(&pool, "UTC").await;
    for day in 10..=14 {
        post_session(
            &pool,
            &user_id,
            core_session(
                &format!("2024-01-{day}T22:00:00Z"),
                &format!("2024-01-{day}T23:30:00Z"),
            ),
        )
        .await;
    }

    let app = common::build_test_app(pool.clone());
    let json = body_json(
        get(
            app,
            &format!(
                "/api/v1/users/{user_id}/sleep-sessions\
                 ?from=2024-01-11T00:00:00Z&to=2024-01-13T00:00:00Z"
            ),
        )
        .await,
    )
    .await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["start_at"], "2024-01-12T22:00:00Z");
    assert_eq!(data[1]["start_at"], "2024-01-11T22:00:00Z");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_for_unknown_user_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let id = uuid::Uuid::new_v4();
    let response = get(app, &format!("/api/v1/users/{id}/sleep-sessions")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
