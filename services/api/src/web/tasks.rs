//! services/api/src/web/tasks.rs
//!
//! Handlers for the two toggleable task lists: homework and todos. Both
//! flip `is_finished` freely; the toggle is its own inverse.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use studyhub_core::domain::{NewHomework, NewTodo};
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::middleware::CurrentAccount;
use crate::web::state::AppState;

//=========================================================================================
// Homework
//=========================================================================================

/// GET /homework - Homework ordered by due date, soonest first.
pub async fn list_homework_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse, HttpError> {
    let items = state.store.list_homework(owner).await?;
    Ok(Json(items))
}

pub async fn create_homework_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Json(req): Json<NewHomework>,
) -> Result<impl IntoResponse, HttpError> {
    let item = state.store.create_homework(owner, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn toggle_homework_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Path(homework_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let item = state.store.toggle_homework(owner, homework_id).await?;
    Ok(Json(item))
}

pub async fn delete_homework_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Path(homework_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    state.store.delete_homework(owner, homework_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Todos
//=========================================================================================

pub async fn list_todos_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse, HttpError> {
    let items = state.store.list_todos(owner).await?;
    Ok(Json(items))
}

pub async fn create_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Json(req): Json<NewTodo>,
) -> Result<impl IntoResponse, HttpError> {
    let item = state.store.create_todo(owner, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn toggle_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Path(todo_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let item = state.store.toggle_todo(owner, todo_id).await?;
    Ok(Json(item))
}

pub async fn delete_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Path(todo_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    state.store.delete_todo(owner, todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
