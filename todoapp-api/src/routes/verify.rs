//! Email verification endpoints
//!
//! - `POST /v1/verify-email/:key` - Consume a verification key
//! - `POST /v1/verify-email/resend` - Mail a fresh key to the caller

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use todoapp_shared::models::account::{Account, VerifyOutcome};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Caller,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Marks the key's account as verified
///
/// # Errors
///
/// - `404 Not Found`: unknown or already used key
/// - `410 Gone`: key older than 24 hours; ask for a new one
pub async fn verify(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    match Account::verify_email(&state.store, &key).await? {
        VerifyOutcome::Verified => Ok(MessageResponse::new("Email verified")),
        VerifyOutcome::Expired => Err(ApiError::Gone(
            "Verification key expired, request a new one".to_string(),
        )),
    }
}

/// Issues and mails a new verification key unless already verified
pub async fn resend(
    State(state): State<AppState>,
    Caller(ctx): Caller,
) -> ApiResult<Json<MessageResponse>> {
    let account = Account::find_by_id(&state.store, ctx.account_id).await?;
    if account.email_verified {
        return Ok(MessageResponse::new("Already verified"));
    }

    let key = Account::regenerate_verification_key(&state.store, account.id).await?;
    state.send_verification(&account.email, &key).await;

    Ok(MessageResponse::new("Verification email sent"))
}
