//! Todo list endpoints
//!
//! - `GET /v1/todo-lists?page&count&order&sort_by` - One page of lists (204 when empty)
//! - `POST /v1/todo-lists` - Create a list
//! - `PUT /v1/todo-lists/:list_id` - Rename or reposition a list
//! - `DELETE /v1/todo-lists/:list_id` - Delete a list and its tasks
//!
//! Lists are always scoped to the caller's (or superuser target's) account.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use todoapp_shared::models::{
    todo_list::{TodoList, TodoListPatch},
    PageQuery,
};
use uuid::Uuid;
use validator::Validate;

use crate::{app::AppState, error::ApiResult, extract::Caller, routes::list_response};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateListRequest {
    #[validate(length(min = 1, max = 1000, message = "Title must be 1-1000 characters"))]
    pub title: String,
}

pub async fn list(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    list_response(TodoList::list(&state.store, ctx.account_id, &query).await)
}

pub async fn create(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    payload: Result<Json<CreateListRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TodoList>)> {
    let Json(req) = payload?;
    req.validate()?;

    let list = TodoList::create(&state.store, ctx.account_id, &req.title).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// Applies the non-empty fields of the patch and returns the list
pub async fn update(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(list_id): Path<Uuid>,
    payload: Result<Json<TodoListPatch>, JsonRejection>,
) -> ApiResult<Json<TodoList>> {
    let Json(patch) = payload?;

    TodoList::update(&state.store, ctx.account_id, list_id, &patch).await?;
    let list = TodoList::find(&state.store, ctx.account_id, list_id).await?;
    Ok(Json(list))
}

pub async fn delete(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(list_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    TodoList::delete(&state.store, ctx.account_id, list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
