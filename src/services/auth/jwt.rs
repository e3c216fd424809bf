use jsonwebtoken::{Algorithm, EncodingKey, Header};
use tracing::error;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::access_jwt::AccessTokenClaims;

/// Signs access tokens with the process-wide HMAC secret.
#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    issuer: Option<String>,
    ttl_seconds: u64,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(
        secret: &[u8],
        algorithm: Algorithm,
        issuer: Option<String>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            algorithm,
            issuer,
            ttl_seconds,
            encoding_key: EncodingKey::from_secret(secret),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_algorithm,
            config.jwt_issuer.clone(),
            config.access_token_ttl_seconds,
        )
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Issue an access token for `subject` valid for the configured TTL.
    pub fn issue(&self, subject: &str, roles: &[String]) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let exp = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| {
                error!(ttl_seconds = self.ttl_seconds, "token lifetime out of range");
                AppError::Internal
            })?;
        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            roles: roles.to_vec(),
            iat: Some(now),
            exp,
            iss: self.issuer.clone(),
        };

        self.sign(&claims)
    }

    pub fn sign(&self, claims: &AccessTokenClaims) -> Result<String, AppError> {
        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            AppError::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::access_jwt::TokenVerifier;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_tokens_verify() {
        let issuer = TokenIssuer::new(SECRET, Algorithm::HS384, Some("jwt-gate".into()), 300);
        let verifier = TokenVerifier::new(SECRET, Algorithm::HS384, Some("jwt-gate"), 0);

        let token = issuer.issue("bob", &["USERS".to_string()]).unwrap();
        let claims = verifier.verify_claims(&token).unwrap();

        assert_eq!(claims.sub, "bob");
        assert_eq!(claims.roles, vec!["USERS".to_string()]);
        assert_eq!(claims.iss.as_deref(), Some("jwt-gate"));
        let iat = claims.iat.unwrap();
        assert_eq!(claims.exp - iat, 300);
    }

    #[test]
    fn unrepresentable_lifetime_is_an_error() {
        for ttl in [u64::MAX, i64::MAX as u64] {
            let issuer = TokenIssuer::new(SECRET, Algorithm::HS512, None, ttl);
            assert!(matches!(
                issuer.issue("bob", &[]),
                Err(AppError::Internal)
            ));
        }
    }
}
