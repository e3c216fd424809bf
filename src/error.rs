/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status + generic JSON error body, no internal detail)
 * - Map authorization denials to 401 / 403
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::authorizer::DenyReason;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("conflict: {resource}")]
    Conflict { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            AppError::BadRequest { code, message } => (code, message),
            AppError::Unauthorized => ("UNAUTHORIZED", "unauthorized".into()),
            AppError::Forbidden => ("FORBIDDEN", "forbidden".into()),
            AppError::Conflict { resource } => ("CONFLICT", format!("{resource} already exists.")),
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "internal server error".into()),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::MissingToken
            | DenyReason::MalformedToken
            | DenyReason::InvalidSignature
            | DenyReason::ExpiredToken
            | DenyReason::InvalidToken => AppError::Unauthorized,
            DenyReason::InsufficientRole | DenyReason::AccessDenied | DenyReason::NoMatchingRule => {
                AppError::Forbidden
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::Conflict { resource: "user" },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_problems_are_401() {
        for reason in [
            DenyReason::MissingToken,
            DenyReason::MalformedToken,
            DenyReason::InvalidSignature,
            DenyReason::ExpiredToken,
            DenyReason::InvalidToken,
        ] {
            assert_eq!(AppError::from(reason).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn role_problems_are_403() {
        for reason in [
            DenyReason::InsufficientRole,
            DenyReason::AccessDenied,
            DenyReason::NoMatchingRule,
        ] {
            assert_eq!(AppError::from(reason).status(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let response = AppError::Forbidden.into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
