//! Account endpoints
//!
//! - `POST /v1/users` - Sign up
//! - `GET|PUT|DELETE /v1/users/me` - Own account
//! - `GET|PUT|DELETE /v1/users/:id` - Same, on `:id` for superusers
//!
//! Non-superusers hitting `/v1/users/:id` act on their own account.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use todoapp_shared::{
    error::Error,
    models::account::{Account, AccountPatch, NewAccount},
};
use tracing::info;
use validator::Validate;

use crate::{app::AppState, error::ApiResult, extract::Caller};

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 1024, message = "Password must be 8-1024 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Username must be at most 100 characters"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Surname must be at most 100 characters"))]
    pub surname: String,
}

/// Profile update request; omitted or empty fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub email: String,

    #[validate(length(max = 100, message = "Username must be at most 100 characters"))]
    pub username: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Surname must be at most 100 characters"))]
    pub surname: String,

    /// New password, if changing it
    #[validate(length(max = 1024, message = "Password is too long"))]
    pub password: String,
}

/// Creates an account and mails its verification link
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `409 Conflict`: email already registered
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let Json(req) = payload?;
    req.validate()?;

    let account = Account::create(
        &state.store,
        NewAccount {
            email: req.email,
            password: req.password,
            username: req.username,
            name: req.name,
            surname: req.surname,
        },
    )
    .await?;

    if let Some(key) = &account.email_verification_key {
        state.send_verification(&account.email, key).await;
    }

    Ok((StatusCode::CREATED, Json(account)))
}

/// Reads the caller's (or the superuser target's) account
pub async fn read(
    State(state): State<AppState>,
    Caller(ctx): Caller,
) -> ApiResult<Json<Account>> {
    let account = Account::find_by_id(&state.store, ctx.account_id).await?;
    Ok(Json(account))
}

/// Updates profile fields and, optionally, the password
///
/// A new email resets verification and triggers a fresh verification mail.
pub async fn update(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<Account>> {
    let Json(req) = payload?;
    req.validate()?;

    let patch = AccountPatch {
        email: req.email,
        username: req.username,
        name: req.name,
        surname: req.surname,
    };

    if !patch.is_empty() {
        if let Some(key) = Account::update_profile(&state.store, ctx.account_id, &patch).await? {
            let account = Account::find_by_id(&state.store, ctx.account_id).await?;
            state.send_verification(&account.email, &key).await;
        }
    }

    if !req.password.is_empty() {
        Account::change_password(&state.store, ctx.account_id, &req.password).await?;
    }

    let account = Account::find_by_id(&state.store, ctx.account_id).await?;
    Ok(Json(account))
}

/// Soft-deletes the account and revokes all its sessions
///
/// Deleting one's own account also clears the session cookie.
pub async fn delete(State(state): State<AppState>, Caller(ctx): Caller) -> ApiResult<Response> {
    Account::delete(&state.store, ctx.account_id).await?;

    match state.sessions.delete_all(ctx.account_id).await {
        Ok(_) | Err(Error::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    info!(
        account_id = %ctx.account_id,
        caller_id = %ctx.caller_id,
        "Account closed"
    );

    if ctx.is_acting_as_other() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let cookie = state.sessions.removal_cookie().to_string();
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}
