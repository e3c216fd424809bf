/*
 * Responsibility
 * - POST /users: open sign-up (always the USERS role)
 * - GET /users: directory listing for USERS / MANAGERS
 */
use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    api::v1::dto::users::{CreateUserRequest, UserResponse},
    error::AppError,
    repos::user_repo::UserRow,
    services::auth::{password::hash_password, policy::ROLE_USERS},
    state::AppState,
};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let rows = state.users.list().await?;
    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_USER", msg))?;

    let password_hash = hash_password(req.password, state.bcrypt_cost).await?;

    let row = state
        .users
        .create(UserRow {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            username: req.username.trim().to_string(),
            password_hash,
            roles: vec![ROLE_USERS.to_string()],
        })
        .await?;

    tracing::info!(user_id = %row.id, username = %row.username, "user registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(row))))
}
