//! API route handlers
//!
//! - `health`: health check
//! - `users`: signup and account management
//! - `auth`: login, logout and session management
//! - `verify`: email verification
//! - `todo_lists`, `tasks`: todo list and task CRUD

pub mod auth;
pub mod health;
pub mod tasks;
pub mod todo_lists;
pub mod users;
pub mod verify;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use todoapp_shared::error::Error;

use crate::error::ApiResult;

/// Renders a list read; an empty page is `204 No Content`
pub(crate) fn list_response<T: Serialize>(result: Result<Vec<T>, Error>) -> ApiResult<Response> {
    match result {
        Ok(items) => Ok(Json(items).into_response()),
        Err(Error::NotFound) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => Err(e.into()),
    }
}
