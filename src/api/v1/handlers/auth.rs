/*
 * Responsibility
 * - POST /login: check credentials against the user directory, hand out an access token
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::dto::login::{LoginRequest, TokenResponse},
    error::AppError,
    services::auth::password::verify_password,
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let username = req.username.trim();
    let Some(user) = state.users.find_by_username(username).await? else {
        verify_password(req.password, state.dummy_password_hash.to_string()).await?;
        tracing::info!(username, "login for unknown user");
        return Err(AppError::Unauthorized);
    };

    if !verify_password(req.password, user.password_hash.clone()).await? {
        tracing::info!(username, "login with wrong password");
        return Err(AppError::Unauthorized);
    }

    let access_token = state.issuer.issue(&user.username, &user.roles)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.issuer.ttl_seconds(),
    }))
}
