/*
 * Responsibility
 * - URL layout of the protected API
 * - Who may call what lives in the access policy, not here
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::login,
    managers::managers,
    users::{create_user, list_users},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/users", get(list_users).post(create_user))
        .route("/managers", get(managers))
}
