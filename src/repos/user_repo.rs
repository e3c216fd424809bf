/*
 * Responsibility
 * - User directory consulted by login / sign-up handlers (never by the authorization filter)
 * - In-memory backend; another store only has to implement `UserRepo`
 */
use std::collections::HashMap;
use std::{future::Future, pin::Pin};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepoError>> + Send + 'a>>;

pub trait UserRepo: Send + Sync {
    // Fails with `Conflict` when the username is taken.
    fn create(&self, row: UserRow) -> RepoFuture<'_, UserRow>;

    fn find_by_username<'a>(&'a self, username: &'a str) -> RepoFuture<'a, Option<UserRow>>;

    // Ordered by username.
    fn list(&self) -> RepoFuture<'_, Vec<UserRow>>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepo {
    // keyed by username
    users: RwLock<HashMap<String, UserRow>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepo for InMemoryUserRepo {
    fn create(&self, row: UserRow) -> RepoFuture<'_, UserRow> {
        Box::pin(async move {
            let mut users = self.users.write().await;
            if users.contains_key(&row.username) {
                return Err(RepoError::Conflict);
            }
            users.insert(row.username.clone(), row.clone());
            Ok(row)
        })
    }

    fn find_by_username<'a>(&'a self, username: &'a str) -> RepoFuture<'a, Option<UserRow>> {
        Box::pin(async move { Ok(self.users.read().await.get(username).cloned()) })
    }

    fn list(&self) -> RepoFuture<'_, Vec<UserRow>> {
        Box::pin(async move {
            let mut rows: Vec<UserRow> = self.users.read().await.values().cloned().collect();
            rows.sort_by(|a, b| a.username.cmp(&b.username));
            Ok(rows)
        })
    }
}
