//! Credential store: the `users` table and its point lookups / partial updates.

use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::DbPool;
use crate::error::{AppError, AppResult};

/// A user record. `session_id` and `reset_token` are nullable and unique
/// when present; neither excludes the other.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub hashed_password: String,
    pub session_id: Option<String>,
    pub reset_token: Option<String>,
}

/// Single lookup criterion. Callers only ever filter by one attribute, so
/// the store takes a tagged field/value pair instead of an open filter map.
#[derive(Debug, Clone, Copy)]
pub enum UserFilter<'a> {
    Id(i64),
    Email(&'a str),
    SessionId(&'a str),
    ResetToken(&'a str),
}

/// Partial update. Outer `None` leaves a column untouched; for the nullable
/// columns the inner `Option` distinguishes a new value from clearing.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub hashed_password: Option<String>,
    pub session_id: Option<Option<String>>,
    pub reset_token: Option<Option<String>>,
}

impl UserPatch {
    fn is_empty(&self) -> bool {
        self.hashed_password.is_none() && self.session_id.is_none() && self.reset_token.is_none()
    }
}

/// SQLite-backed store for user records. Cheap to clone; every statement
/// checks a connection out of the shared pool.
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new user. A duplicate email maps the unique-constraint
    /// violation to `DuplicateEmail`.
    pub async fn add_user(&self, email: &str, hashed_password: &str) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, hashed_password) VALUES (?, ?) \
             RETURNING id, email, hashed_password, session_id, reset_token",
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::DuplicateEmail(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Point lookup by exactly one attribute; a miss is `NotFound`.
    pub async fn find_user_by(&self, filter: UserFilter<'_>) -> AppResult<User> {
        let query = match filter {
            UserFilter::Id(id) => {
                sqlx::query_as::<_, User>(
                    "SELECT id, email, hashed_password, session_id, reset_token FROM users WHERE id = ?",
                )
                .bind(id)
            }
            UserFilter::Email(email) => sqlx::query_as::<_, User>(
                "SELECT id, email, hashed_password, session_id, reset_token FROM users WHERE email = ?",
            )
            .bind(email),
            UserFilter::SessionId(session_id) => sqlx::query_as::<_, User>(
                "SELECT id, email, hashed_password, session_id, reset_token FROM users WHERE session_id = ?",
            )
            .bind(session_id),
            UserFilter::ResetToken(reset_token) => sqlx::query_as::<_, User>(
                "SELECT id, email, hashed_password, session_id, reset_token FROM users WHERE reset_token = ?",
            )
            .bind(reset_token),
        };

        query
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string()))
    }

    /// Apply a partial update to one user. An empty patch is a no-op; an
    /// unknown id is `NotFound`.
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> AppResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(hashed_password) = patch.hashed_password {
                fields.push("hashed_password = ");
                fields.push_bind_unseparated(hashed_password);
            }
            if let Some(session_id) = patch.session_id {
                fields.push("session_id = ");
                fields.push_bind_unseparated(session_id);
            }
            if let Some(reset_token) = patch.reset_token {
                fields.push("reset_token = ");
                fields.push_bind_unseparated(reset_token);
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user".to_string()));
        }
        Ok(())
    }
}
