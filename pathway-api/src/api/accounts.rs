//! Signup and login

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use pathway_common::api::types::{Credentials, LoginResponse, MessageResponse};
use pathway_common::api::{create_session, hash_password, verify_password, ApiAuthError};
use tracing::info;

use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(credentials) = payload?;
    let email = credentials.email.trim().to_string();

    if email.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    // argon2 runs on the blocking pool
    let password = credentials.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let user_id = users::create(&state.db, &email, &password_hash)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User already exists".to_string()))?;

    info!(user_id = %user_id, "Account created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(credentials) = payload?;

    let user = users::find_by_email(&state.db, credentials.email.trim())
        .await?
        .ok_or(ApiAuthError::InvalidCredentials)?;

    let stored_hash = user.password_hash.clone();
    let password = credentials.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !valid {
        return Err(ApiAuthError::InvalidCredentials.into());
    }

    let token = create_session(&state.db, &user.guid).await?;
    info!(user_id = %user.guid, "Session created");

    Ok(Json(LoginResponse {
        token,
        user_id: user.guid,
    }))
}
