//! Todo API endpoints
//!
//! RESTful API for todo CRUD operations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use todo_core::filter::TaskFilter;
use todo_core::stats::TodoStats;
use todo_core::task::{NewTask, Priority, TaskPatch, TaskRepository, WireTask};
use todo_core::Error;

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: TodoStats,
    pub completion_rate: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn map_store_error(err: Error) -> ApiError {
    let status = match &err {
        Error::TaskNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Todo store failure: {}", err);
    }
    api_error(status, err.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/todos - List todos, optionally filtered and sorted
async fn list_todos(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<WireTask>>, ApiError> {
    let store = state.task_store();
    let tasks = match filter.priority {
        Some(priority) => store.find_by_priority(priority).await,
        None => store.list().await,
    }
    .map_err(map_store_error)?;
    let shown = filter.apply(&tasks, Utc::now());

    Ok(Json(shown.into_iter().map(WireTask::from).collect()))
}

/// POST /api/todos - Create a new todo
async fn create_todo(
    State(state): State<AppState>,
    Json(req): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<WireTask>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Title cannot be empty"));
    }

    let mut new = NewTask::new(req.title);

    if let Some(desc) = req.description {
        new = new.with_description(desc);
    }

    if let Some(priority) = req.priority {
        new = new.with_priority(priority);
    }

    if let Some(due_date) = req.due_date {
        new = new.with_due_date(due_date);
    }

    if let Some(notes) = req.notes {
        new = new.with_notes(notes);
    }

    let created = state.task_store().create(new).await.map_err(map_store_error)?;
    tracing::info!("Created todo {}", created.id);

    Ok((StatusCode::CREATED, Json(WireTask::from(created))))
}

/// GET /api/todos/stats - Aggregate counts over every todo
async fn todo_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let tasks = state.task_store().list().await.map_err(map_store_error)?;
    let stats = TodoStats::compute(&tasks, Utc::now());

    Ok(Json(StatsResponse {
        completion_rate: stats.completion_rate(),
        stats,
    }))
}

/// GET /api/todos/:id - Get a single todo
async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WireTask>, ApiError> {
    let task = state.task_store().get(&id).await.map_err(map_store_error)?;

    match task {
        Some(t) => Ok(Json(WireTask::from(t))),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Todo {} not found", id),
        )),
    }
}

/// PATCH /api/todos/:id - Update a todo
async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<WireTask>, ApiError> {
    if patch.has_blank_title() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Title cannot be empty"));
    }

    let updated = state
        .task_store()
        .update(&id, patch)
        .await
        .map_err(map_store_error)?;

    Ok(Json(WireTask::from(updated)))
}

/// DELETE /api/todos/:id - Delete a todo. Already-deleted ids also get 204.
async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.task_store().delete(&id).await.map_err(map_store_error)?;
    if !deleted {
        tracing::debug!("Delete of unknown todo {}", id);
    }

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/stats", get(todo_stats))
        .route(
            "/api/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
}
