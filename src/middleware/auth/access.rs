//! Authorization filter: classify → (public | verify bearer token) → role check.
//!
//! On success the resolved `Principal` (anonymous for public rules) is put into request
//! extensions for handlers. On failure the request stops here with 401 / 403.

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Put the authorization filter in front of every route of `router`.
///
/// ```ignore
/// let api = api::v1::routes();
/// let api = middleware::auth::access::apply(api, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Classify on the full path even when mounted under nest()
    let path = original_uri.path();

    let principal = match state
        .authorizer
        .authorize(req.method(), path, req.headers())
    {
        Ok(principal) => principal,
        Err(reason) => {
            tracing::warn!(
                method = %req.method(),
                path,
                reason = %reason,
                "request denied"
            );
            return Err(reason.into());
        }
    };

    // middleware → extractor
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
