use super::executor::JobExecutor;
use super::protocol::*;

use axum::{Extension, Json, http::StatusCode};
use std::sync::Arc;

pub async fn handle_execute(
    Extension(executor): Extension<Arc<JobExecutor>>,
    Json(req): Json<ExecuteRequest>,
) -> (StatusCode, Json<ExecuteResponse>) {
    tracing::debug!(
        "Received task {} (handler: {})",
        req.task_id,
        req.task.handler()
    );

    match executor.execute(&req.task_id, &req.task).await {
        Ok(duration) => (
            StatusCode::OK,
            Json(ExecuteResponse {
                task_id: req.task_id,
                success: true,
                duration_ms: duration.as_millis() as u64,
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExecuteResponse {
                task_id: req.task_id,
                success: false,
                duration_ms: 0,
                error: Some(e.to_string()),
            }),
        ),
    }
}
