//! Authentication endpoints
//!
//! # Endpoints
//!
//! - `POST /v1/auth/login` - Start a session, set the session cookie
//! - `POST /v1/auth/logout` - Revoke the current session
//! - `GET /v1/auth/me` - Caller summary
//! - `GET /v1/auth/sessions` - Device list
//! - `DELETE /v1/auth/sessions/others` - Revoke every other session

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use todoapp_shared::{
    auth::password,
    error::Error,
    models::account::{Account, MeView},
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{client_info, Caller},
    routes::list_response,
};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Login response; the token itself travels in `Set-Cookie`
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub account_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Response of `DELETE /v1/auth/sessions/others`
#[derive(Debug, Serialize, Deserialize)]
pub struct RevokedResponse {
    pub revoked: u64,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

/// Login endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "correct horse battery" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    req.validate()?;

    let account = match Account::find_by_email(&state.store, &req.email).await {
        Ok(account) => account,
        Err(Error::NotFound) => return Err(invalid_credentials()),
        Err(e) => return Err(e.into()),
    };

    let valid = password::verify_password(&req.password, &account.password_hash)
        .map_err(|e| ApiError::InternalError(format!("Password verification failed: {e}")))?;
    if !valid {
        warn!(account_id = %account.id, "Failed login attempt");
        return Err(invalid_credentials());
    }

    let (session, cookie) = state
        .sessions
        .create(account.id, &client_info(&headers))
        .await?;

    let body = Json(LoginResponse {
        account_id: account.id,
        expires_at: session.expires_at,
    });
    Ok(([(header::SET_COOKIE, cookie.to_string())], body).into_response())
}

/// Revokes the session the request came with and clears the cookie
pub async fn logout(State(state): State<AppState>, Caller(ctx): Caller) -> ApiResult<Response> {
    state.sessions.delete(&ctx.token).await?;
    info!(account_id = %ctx.caller_id, session_id = %ctx.session_id, "Logged out");

    let cookie = state.sessions.removal_cookie().to_string();
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}

/// Caller summary: id, email, username, verification and superuser flags
pub async fn me(State(state): State<AppState>, Caller(ctx): Caller) -> ApiResult<Json<MeView>> {
    let me = Account::me(&state.store, ctx.account_id).await?;
    Ok(Json(me))
}

/// Active sessions of the account, newest first
pub async fn sessions(State(state): State<AppState>, Caller(ctx): Caller) -> ApiResult<Response> {
    list_response(state.sessions.read_all(ctx.account_id).await)
}

/// Revokes every session of the caller except the current one
///
/// # Errors
///
/// - `404 Not Found`: there was no other session
pub async fn close_other_sessions(
    State(state): State<AppState>,
    Caller(ctx): Caller,
) -> ApiResult<Json<RevokedResponse>> {
    let revoked = state
        .sessions
        .delete_all_except_one(ctx.caller_id, &ctx.token)
        .await?;
    Ok(Json(RevokedResponse { revoked }))
}
