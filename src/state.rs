/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Cheap to Clone: everything inside is Arc or Copy
 * - The authorizer half is read-only; only the user directory is mutable
 */
use std::sync::Arc;

use crate::repos::user_repo::UserRepo;
use crate::services::auth::{Authorizer, TokenIssuer};

#[derive(Clone)]
pub struct AppState {
    pub authorizer: Authorizer,
    pub issuer: Arc<TokenIssuer>,
    pub users: Arc<dyn UserRepo>,
    pub bcrypt_cost: u32,
    // Checked against when the username is unknown, so both login failures cost one bcrypt verify.
    pub dummy_password_hash: Arc<str>,
}

impl AppState {
    pub fn new(
        authorizer: Authorizer,
        issuer: Arc<TokenIssuer>,
        users: Arc<dyn UserRepo>,
        bcrypt_cost: u32,
        dummy_password_hash: String,
    ) -> Self {
        Self {
            authorizer,
            issuer,
            users,
            bcrypt_cost,
            dummy_password_hash: dummy_password_hash.into(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("authorizer", &self.authorizer)
            .field("issuer", &self.issuer)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}
