//! Bearer-token authentication middleware
//!
//! Applied to protected routes only; `/health`, login, signup, the public
//! assessment view and lead submission skip it.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use pathway_common::api::{parse_bearer, resolve_session, ApiAuthError};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated caller, inserted as a request extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

/// Resolve `Authorization: Bearer <token>` to an [`AuthUser`].
///
/// Missing, unknown and expired tokens all answer 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .map(str::to_string)
        .ok_or(ApiAuthError::MissingToken)?;

    let user_id = resolve_session(&state.db, &token).await.map_err(|e| {
        debug!(path = %request.uri().path(), "Rejected request: {}", e);
        e
    })?;

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}
