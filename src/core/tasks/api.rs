//! Task API endpoints
//!
//! All routes require a bearer access token:
//! - GET /api/v1/tasks - List the caller's tasks
//! - POST /api/v1/tasks - Create a task
//! - GET /api/v1/tasks/{id} - Read a task
//! - PUT /api/v1/tasks/{id} - Update a task
//! - DELETE /api/v1/tasks/{id} - Delete a task

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::guard::{Principal, require_auth};
use crate::core::auth::service::SessionService;
use crate::core::db::models::TaskResponse;
use crate::core::error::{ApiError, internal_error};
use crate::core::tasks::service::{TaskError, TaskService};

/// Task API state
#[derive(Clone)]
pub struct TasksApiState {
    pub tasks: TaskService,
    pub sessions: SessionService,
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            TaskError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            TaskError::AccountNotFound => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            TaskError::NotFound => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND"),
            TaskError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            TaskError::Internal(detail) => {
                return internal_error("Task operation failed", detail);
            }
        };

        ApiError::new(self.to_string(), code).into_response_with(status)
    }
}

/// Create / update request data
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

/// Create the task API router
pub fn tasks_api_router(state: TasksApiState) -> Router {
    let guard = middleware::from_fn_with_state(state.sessions.clone(), require_auth);
    let state = Arc::new(state);

    Router::new()
        .route("/api/v1/tasks", get(list_handler).post(create_handler))
        .route(
            "/api/v1/tasks/{id}",
            get(read_handler).put(update_handler).delete(delete_handler),
        )
        .route_layer(guard)
        .with_state(state)
}

/// GET /api/v1/tasks
async fn list_handler(
    State(state): State<Arc<TasksApiState>>,
    principal: Principal,
) -> Result<Json<Vec<TaskResponse>>, TaskError> {
    let tasks = state.tasks.list(principal.account_id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// POST /api/v1/tasks
async fn create_handler(
    State(state): State<Arc<TasksApiState>>,
    principal: Principal,
    Json(request): Json<TaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), TaskError> {
    let task = state
        .tasks
        .create(principal.account_id, &request.name, request.completed)
        .await?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// GET /api/v1/tasks/{id}
async fn read_handler(
    State(state): State<Arc<TasksApiState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponse>, TaskError> {
    let task = state.tasks.read(&principal, id).await?;
    Ok(Json(task.into()))
}

/// PUT /api/v1/tasks/{id}
async fn update_handler(
    State(state): State<Arc<TasksApiState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(request): Json<TaskRequest>,
) -> Result<Json<TaskResponse>, TaskError> {
    let task = state
        .tasks
        .update(&principal, id, &request.name, request.completed)
        .await?;

    Ok(Json(task.into()))
}

/// DELETE /api/v1/tasks/{id}
async fn delete_handler(
    State(state): State<Arc<TasksApiState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, TaskError> {
    state.tasks.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
