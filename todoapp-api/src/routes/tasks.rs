//! Task endpoints, nested under a todo list
//!
//! - `GET /v1/todo-lists/:list_id/tasks?page&count` - One page of tasks (204 when empty)
//! - `POST /v1/todo-lists/:list_id/tasks` - Add a task
//! - `PUT /v1/todo-lists/:list_id/tasks/:task_id` - Replace a task's fields
//! - `DELETE /v1/todo-lists/:list_id/tasks/:task_id` - Delete a task
//!
//! A list the caller does not own answers 404, same as a missing one.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use todoapp_shared::models::{
    task::{Task, TaskPatch},
    todo_list::TodoList,
    PageQuery,
};
use uuid::Uuid;
use validator::Validate;

use crate::{app::AppState, error::ApiResult, extract::Caller, routes::list_response};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 1000, message = "Title must be 1-1000 characters"))]
    pub title: String,
}

pub async fn list(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(list_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    TodoList::find(&state.store, ctx.account_id, list_id).await?;
    list_response(Task::list(&state.store, ctx.account_id, list_id, &query).await)
}

pub async fn create(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(list_id): Path<Uuid>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;
    req.validate()?;

    TodoList::find(&state.store, ctx.account_id, list_id).await?;
    let task = Task::create(&state.store, ctx.account_id, list_id, &req.title).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Overwrites every editable field, then returns the stored task
pub async fn update(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path((list_id, task_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(patch) = payload?;

    Task::update(&state.store, ctx.account_id, list_id, task_id, &patch).await?;
    let task = Task::find(&state.store, ctx.account_id, list_id, task_id).await?;
    Ok(Json(task))
}

pub async fn delete(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path((list_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    Task::delete(&state.store, ctx.account_id, list_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
