//! In-memory user directory.
//!
//! A transaction holds the directory lock for its whole lifetime and works on a
//! staged copy, so transactions are fully serialized.
use super::{DirectoryError, DirectoryTx, NewUser, UserChanges, UserDirectory, UserRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use usergate_common::UserId;

#[derive(Debug, Clone, Default)]
struct Table {
    next_id: UserId,
    users: BTreeMap<UserId, UserRecord>,
}

impl Table {
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.user_id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.user_id) != except)
    }
}

/// Process-local directory, used for tests and single-node development
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    table: Arc<Mutex<Table>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Transaction over an [`InMemoryDirectory`]
pub struct InMemoryTx {
    guard: OwnedMutexGuard<Table>,
    staged: Table,
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<Self::Tx, DirectoryError> {
        let guard = self.table.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTx { guard, staged })
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let table = self.table.lock().await;
        let mut users: Vec<UserRecord> = table.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.user_id.cmp(&a.user_id)));
        Ok(users)
    }
}

#[async_trait]
impl DirectoryTx for InMemoryTx {
    async fn exists_by_username(&mut self, username: &str) -> Result<bool, DirectoryError> {
        Ok(self.staged.username_taken(username, None))
    }

    async fn exists_by_email(&mut self, email: &str) -> Result<bool, DirectoryError> {
        Ok(self.staged.email_taken(email, None))
    }

    async fn exists_by_id(&mut self, user_id: UserId) -> Result<bool, DirectoryError> {
        Ok(self.staged.users.contains_key(&user_id))
    }

    async fn find_by_username(&mut self, username: &str) -> Result<UserRecord, DirectoryError> {
        self.staged
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn find_by_id(&mut self, user_id: UserId) -> Result<UserRecord, DirectoryError> {
        self.staged
            .users
            .get(&user_id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn insert(&mut self, user: &NewUser) -> Result<UserId, DirectoryError> {
        if self.staged.username_taken(&user.username, None) {
            return Err(DirectoryError::Conflict("username".to_string()));
        }
        if self.staged.email_taken(&user.email, None) {
            return Err(DirectoryError::Conflict("email".to_string()));
        }

        self.staged.next_id += 1;
        let user_id = self.staged.next_id;
        let now = Utc::now();
        self.staged.users.insert(
            user_id,
            UserRecord {
                user_id,
                username: user.username.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                is_admin: user.is_admin,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(user_id)
    }

    async fn update(&mut self, changes: &UserChanges) -> Result<(), DirectoryError> {
        let id = Some(changes.user_id);
        if self.staged.username_taken(&changes.username, id) {
            return Err(DirectoryError::Conflict("username".to_string()));
        }
        if self.staged.email_taken(&changes.email, id) {
            return Err(DirectoryError::Conflict("email".to_string()));
        }

        let record = self
            .staged
            .users
            .get_mut(&changes.user_id)
            .ok_or(DirectoryError::NotFound)?;
        record.username = changes.username.clone();
        record.email = changes.email.clone();
        record.password_hash = changes.password_hash.clone();
        record.is_admin = changes.is_admin;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&mut self, user_id: UserId) -> Result<(), DirectoryError> {
        self.staged
            .users
            .remove(&user_id)
            .map(|_| ())
            .ok_or(DirectoryError::NotFound)
    }

    async fn commit(mut self) -> Result<(), DirectoryError> {
        *self.guard = self.staged;
        Ok(())
    }
}
