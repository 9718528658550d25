//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use somna_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::Validate;

/// A user row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    /// IANA zone name; the default rendering zone for this user's sessions.
    pub timezone: String,
    pub created_at: Timestamp,
}

/// DTO for creating a new user.
///
/// The handler additionally checks that `timezone` resolves to a known zone
/// before accepting it.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 64))]
    pub timezone: String,
}

/// User representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub timezone: String,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            timezone: user.timezone,
            created_at: user.created_at,
        }
    }
}
