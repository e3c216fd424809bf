//! bcrypt hashing, run on the blocking pool so request workers are not stalled.

use tracing::error;

use crate::error::AppError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            error!(error = %e, "password hashing task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            error!(error = %e, "failed to hash password");
            AppError::Internal
        })
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is unusable.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            error!(error = %e, "password verification task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            error!(error = %e, "stored password hash is invalid");
            AppError::Internal
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip() {
        let hash = hash_password("s3cret-pass".into(), 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("s3cret-pass".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".into(), hash).await.unwrap());
    }
}
