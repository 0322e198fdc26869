//! User repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use chathub_core::result::AppResult;
use chathub_core::types::id::UserId;
use chathub_entity::user::{CreateUser, User, UserSummary};

use super::map_db_error;

/// Repository for user lookups and presence flag updates.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find user by id", e))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find user by email", e))
    }

    /// Public projections for a set of users.
    pub async fn find_summaries(&self, ids: &[UserId]) -> AppResult<Vec<UserSummary>> {
        let raw: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, email, is_online, last_seen FROM users WHERE id = ANY($1)",
        )
        .bind(raw)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load user summaries", e))
    }

    /// Insert a new user. Duplicate usernames or emails yield `Conflict`.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, email, password_hash)
               VALUES ($1, $2, $3)
               RETURNING *"#,
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to create user", e))
    }

    /// Write the presence flag and last-seen timestamp.
    pub async fn update_presence(
        &self,
        id: UserId,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET is_online = $2, last_seen = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(online)
        .bind(last_seen)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to update presence", e))?;
        Ok(())
    }
}
