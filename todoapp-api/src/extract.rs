//! Request extractors
//!
//! [`Caller`] resolves the session cookie into an [`AuthContext`]. Routes
//! with an `:id` path parameter pass it as the superuser target, so
//! `GET /v1/users/:id` reads another account only for superusers.

use axum::{
    async_trait,
    extract::{FromRequestParts, RawPathParams},
    http::{header, request::Parts},
};
use todoapp_shared::auth::identity::AuthContext;

use crate::{app::AppState, error::ApiError};

/// Path parameter naming the account a superuser acts on
pub const TARGET_PARAM: &str = "id";

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct Caller(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let target = RawPathParams::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|params| {
                params
                    .iter()
                    .find(|(key, _)| *key == TARGET_PARAM)
                    .map(|(_, value)| value.to_string())
            });

        let ctx = state
            .resolver
            .resolve(&parts.headers, target.as_deref())
            .await?;

        Ok(Caller(ctx))
    }
}

/// `User-Agent` of the request, empty when absent
pub fn client_info(headers: &axum::http::HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
