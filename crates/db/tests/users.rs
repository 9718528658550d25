//! Integration tests for the user repository, including the cascade that
//! removes a user's sessions with the user.

use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;

use somna_db::models::sleep_session::{NewSleepSession, SleepType};
use somna_db::models::user::CreateUser;
use somna_db::repositories::{SleepSessionRepo, UserRepo};

fn new_user(timezone: &str) -> CreateUser {
    CreateUser {
        timezone: timezone.to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_and_fetch_user(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Europe/Prague"))
        .await
        .unwrap();
    assert_eq!(user.timezone, "Europe/Prague");

    let fetched = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.timezone, "Europe/Prague");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn exists_reflects_presence(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("UTC")).await.unwrap();
    assert!(UserRepo::exists(&pool, user.id).await.unwrap());
    assert!(!UserRepo::exists(&pool, uuid::Uuid::new_v4()).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_cascades_to_sessions(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("UTC")).await.unwrap();

    let start = Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).unwrap();
    let session = SleepSessionRepo::create(
        &pool,
        &NewSleepSession {
            user_id: user.id,
            start_at: start,
            end_at: start + Duration::hours(8),
            quality: 8,
            session_type: SleepType::Core,
            local_timezone: "UTC".to_string(),
            client_request_id: None,
        },
    )
    .await
    .unwrap();

    assert!(UserRepo::delete(&pool, user.id).await.unwrap());
    assert!(!UserRepo::exists(&pool, user.id).await.unwrap());
    assert!(SleepSessionRepo::find_by_id(&pool, session.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_missing_user_is_false(pool: PgPool) {
    assert!(!UserRepo::delete(&pool, uuid::Uuid::new_v4()).await.unwrap());
}
