use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::services::auth::principal::Principal;

/// Why a bearer token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token rejected: {0}")]
    Rejected(&'static str),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::Rejected("nbf"),
            ErrorKind::InvalidIssuer => Self::Rejected("iss"),
            ErrorKind::InvalidAudience => Self::Rejected("aud"),
            ErrorKind::InvalidAlgorithm => Self::Rejected("alg"),
            // Structural problems: bad segments, base64, JSON, missing claims
            _ => Self::Malformed,
        }
    }
}

/// Access token (JWT) claims.
///
/// `roles` may carry either bare names (`MANAGERS`) or prefixed ones (`ROLE_MANAGERS`);
/// both resolve to the same role once turned into a [`Principal`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HMAC access-token verifier.
///
/// Holds only the immutable key and validation rules, so it is shared freely across
/// requests. Key material is not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(
        secret: &[u8],
        algorithm: Algorithm,
        issuer: Option<&str>,
        leeway_seconds: u64,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = leeway_seconds;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_algorithm,
            config.jwt_issuer.as_deref(),
            config.access_token_leeway_seconds,
        )
    }

    /// Verify signature and expiry, then decode the claims.
    ///
    /// `jsonwebtoken` checks the signature before any claim is looked at, so a tampered
    /// token always surfaces as `InvalidSignature` regardless of what it claims.
    pub fn verify_claims(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }
        if claims.exp <= 0 {
            return Err(TokenError::Malformed);
        }

        Ok(claims)
    }

    /// Verify a bearer token and resolve the principal it identifies.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = self.verify_claims(token)?;
        Ok(Principal::authenticated(claims.sub, &claims.roles))
    }
}
