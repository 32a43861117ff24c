//! PostgreSQL user directory backed by sqlx.
use super::{DirectoryError, DirectoryTx, NewUser, UserChanges, UserDirectory, UserRecord};
use crate::config::StorageSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use usergate_common::UserId;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id     BIGSERIAL PRIMARY KEY,
        username    VARCHAR(50) UNIQUE NOT NULL,
        email       VARCHAR(100) UNIQUE NOT NULL,
        password    VARCHAR(255) NOT NULL,
        is_admin    BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

const SELECT_USER: &str =
    "SELECT user_id, username, email, password, is_admin, created_at, updated_at FROM users";

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    username: String,
    email: String,
    password: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Map unique-constraint violations to [`DirectoryError::Conflict`]
fn classify(err: sqlx::Error) -> DirectoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or("users").to_string();
            return DirectoryError::Conflict(constraint);
        }
    }
    DirectoryError::Database(err)
}

/// Directory stored in the `users` table
#[derive(Clone, Debug)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Open a pool with the configured limits and make sure the schema exists
    pub async fn connect(settings: &StorageSettings) -> Result<Self, DirectoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
            .connect(&settings.database_url)
            .await?;

        let directory = Self::from_pool(pool);
        directory.ensure_schema().await?;
        Ok(directory)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), DirectoryError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction over a [`PgDirectory`]; rolled back by sqlx on drop
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UserDirectory for PgDirectory {
    type Tx = PgTx;

    async fn begin(&self) -> Result<Self::Tx, DirectoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(UserRecord::from).collect())
    }
}

#[async_trait]
impl DirectoryTx for PgTx {
    async fn exists_by_username(&mut self, username: &str) -> Result<bool, DirectoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn exists_by_email(&mut self, email: &str) -> Result<bool, DirectoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn exists_by_id(&mut self, user_id: UserId) -> Result<bool, DirectoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn find_by_username(&mut self, username: &str) -> Result<UserRecord, DirectoryError> {
        sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(UserRecord::from)
            .ok_or(DirectoryError::NotFound)
    }

    async fn find_by_id(&mut self, user_id: UserId) -> Result<UserRecord, DirectoryError> {
        sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE user_id = $1"))
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(UserRecord::from)
            .ok_or(DirectoryError::NotFound)
    }

    async fn insert(&mut self, user: &NewUser) -> Result<UserId, DirectoryError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, email, password, is_admin) VALUES ($1, $2, $3, $4) RETURNING user_id",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn update(&mut self, changes: &UserChanges) -> Result<(), DirectoryError> {
        let result = sqlx::query(
            "UPDATE users SET username = $1, email = $2, password = $3, is_admin = $4, updated_at = CURRENT_TIMESTAMP WHERE user_id = $5",
        )
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(changes.is_admin)
        .bind(changes.user_id)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&mut self, user_id: UserId) -> Result<(), DirectoryError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), DirectoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
