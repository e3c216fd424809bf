//! Per-request authorization decision.
//!
//! Received → Classified → (Public | TokenChecked) → Decided. Nothing carries over between
//! requests: the policy and the verifier are read-only, and no session is created or read.

use std::sync::Arc;

use axum::http::{HeaderMap, Method, header};
use thiserror::Error;

use crate::services::auth::access_jwt::{TokenError, TokenVerifier};
use crate::services::auth::policy::{AccessPolicy, RolePredicate};
use crate::services::auth::principal::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed bearer token")]
    MalformedToken,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    ExpiredToken,
    #[error("token rejected")]
    InvalidToken,
    #[error("insufficient role")]
    InsufficientRole,
    #[error("access denied by rule")]
    AccessDenied,
    #[error("no rule matched")]
    NoMatchingRule,
}

impl From<TokenError> for DenyReason {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed => Self::MalformedToken,
            TokenError::InvalidSignature => Self::InvalidSignature,
            TokenError::Expired => Self::ExpiredToken,
            TokenError::Rejected(_) => Self::InvalidToken,
        }
    }
}

const BEARER: &str = "bearer";

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive. An absent header or a different scheme counts as no
/// token at all; a bearer header with nothing after it is malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, DenyReason> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(DenyReason::MissingToken);
    };
    let value = value.to_str().map_err(|_| DenyReason::MalformedToken)?.trim();

    let (scheme, rest) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(DenyReason::MissingToken);
    }

    let token = rest.trim();
    if token.is_empty() {
        return Err(DenyReason::MalformedToken);
    }
    Ok(token)
}

/// Classifier + verifier, composed.
#[derive(Clone, Debug)]
pub struct Authorizer {
    policy: Arc<AccessPolicy>,
    verifier: Arc<TokenVerifier>,
}

impl Authorizer {
    pub fn new(policy: Arc<AccessPolicy>, verifier: Arc<TokenVerifier>) -> Self {
        Self { policy, verifier }
    }

    pub fn authorize(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Principal, DenyReason> {
        let matched = self.policy.classify(path, method);
        tracing::debug!(
            %method,
            path,
            rule = ?matched.position,
            pattern = %matched.rule.pattern,
            rule_method = %matched.rule.method,
            "request classified"
        );

        match &matched.rule.predicate {
            RolePredicate::Public => return Ok(Principal::anonymous()),
            RolePredicate::DenyAll if matched.is_fallback() => {
                return Err(DenyReason::NoMatchingRule);
            }
            RolePredicate::DenyAll => return Err(DenyReason::AccessDenied),
            RolePredicate::Authenticated | RolePredicate::AnyOf(_) => {}
        }

        let token = bearer_token(headers)?;
        let principal = self.verifier.verify(token)?;

        if matched.rule.predicate.is_satisfied_by(&principal) {
            Ok(principal)
        } else {
            Err(DenyReason::InsufficientRole)
        }
    }
}
