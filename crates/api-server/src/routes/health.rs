//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use todo_core::task::TaskRepository;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    todo_count: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, todo_count) = match state.task_store().list().await {
        Ok(tasks) => ("ok", tasks.len()),
        Err(e) => {
            tracing::warn!("Health check could not read the task store: {}", e);
            ("degraded", 0)
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        todo_count,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
