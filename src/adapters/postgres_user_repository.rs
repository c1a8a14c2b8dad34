//! Postgres implementation of UserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Role, User, UserLookup};
use crate::ports::{RepositoryError, RepositoryResult, UserRepository};

const USER_COLUMNS: &str = "id, username, password, role, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find(&self, lookup: &UserLookup) -> RepositoryResult<User> {
        let row = match lookup {
            UserLookup::Id(id) => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
                    USER_COLUMNS
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            UserLookup::Username(username) => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {} FROM users WHERE username = $1 AND deleted_at IS NULL",
                    USER_COLUMNS
                ))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.ok_or_else(|| RepositoryError::NotFound("user".to_string()))?
            .into_domain()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_domain(self) -> RepositoryResult<User> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| RepositoryError::Decode(format!("user {}: {}", self.id, e)))?;

        Ok(User {
            id: self.id,
            username: self.username,
            password_hash: self.password,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
