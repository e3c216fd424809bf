/*
 * Responsibility
 * - Users request/response DTOs
 * - validate() for shape checks before anything is hashed or stored
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::user_repo::UserRow;

const MIN_PASSWORD_LEN: usize = 8;
// bcrypt only looks at the first 72 bytes
const MAX_PASSWORD_LEN: usize = 72;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        let username = self.username.trim();
        if username.is_empty() {
            return Err("username is required");
        }
        if username.len() > 64 {
            return Err("username must be <= 64 chars");
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err("username may only contain letters, digits, '.', '_' and '-'");
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err("password must be >= 8 chars");
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err("password must be <= 72 bytes");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub roles: Vec<String>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
            roles: row.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: &str, username: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: name.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn validation() {
        assert!(req("Alice", "alice", "password1").validate().is_ok());
        assert!(req(" ", "alice", "password1").validate().is_err());
        assert!(req("Alice", "", "password1").validate().is_err());
        assert!(req("Alice", "al ice", "password1").validate().is_err());
        assert!(req("Alice", "alice", "short").validate().is_err());
        assert!(req("Alice", "alice", &"x".repeat(73)).validate().is_err());
    }
}
