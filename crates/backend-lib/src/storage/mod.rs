// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! User directory abstraction with in-memory and PostgreSQL implementations.
//!
//! Every mutation happens inside a [`DirectoryTx`]. Dropping a transaction
//! without calling [`DirectoryTx::commit`] discards its changes.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use usergate_common::{UserId, UserProfile};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryDirectory;
pub use postgres::PgDirectory;

/// Directory failures
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("user not found")]
    NotFound,

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A stored user, credential included
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    /// Salted hash, never the plaintext
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("is_admin", &self.is_admin)
            .finish_non_exhaustive()
    }
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            username: record.username,
            email: record.email,
            is_admin: record.is_admin,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Fields required to create a user
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Replacement values for an existing user
#[derive(Clone)]
pub struct UserChanges {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Backing store for user records
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    type Tx: DirectoryTx;

    /// Open a transaction
    async fn begin(&self) -> Result<Self::Tx, DirectoryError>;

    /// All users, newest first
    async fn list_users(&self) -> Result<Vec<UserRecord>, DirectoryError>;
}

/// Operations available inside a directory transaction
#[async_trait]
pub trait DirectoryTx: Send {
    async fn exists_by_username(&mut self, username: &str) -> Result<bool, DirectoryError>;

    async fn exists_by_email(&mut self, email: &str) -> Result<bool, DirectoryError>;

    async fn exists_by_id(&mut self, user_id: UserId) -> Result<bool, DirectoryError>;

    async fn find_by_username(&mut self, username: &str) -> Result<UserRecord, DirectoryError>;

    async fn find_by_id(&mut self, user_id: UserId) -> Result<UserRecord, DirectoryError>;

    /// Insert a user and return its new id
    async fn insert(&mut self, user: &NewUser) -> Result<UserId, DirectoryError>;

    async fn update(&mut self, changes: &UserChanges) -> Result<(), DirectoryError>;

    async fn delete(&mut self, user_id: UserId) -> Result<(), DirectoryError>;

    /// Make the transaction's changes visible
    async fn commit(self) -> Result<(), DirectoryError>;
}
