use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::api::v1::extractors::CurrentPrincipal;

/// GET /managers (MANAGERS only; enforced by the access policy, not here)
pub async fn managers(CurrentPrincipal(principal): CurrentPrincipal) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "message": "managers area",
            "subject": principal.subject,
            "roles": principal.roles,
        })),
    )
}
