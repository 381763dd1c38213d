use super::protocol::MetricsResponse;
use super::registry::MetricsRegistry;

use axum::{Extension, Json};
use std::sync::Arc;

pub async fn handle_metrics(
    Extension(registry): Extension<Arc<MetricsRegistry>>,
) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        namespace: registry.namespace().to_string(),
        metrics: registry.snapshot(),
    })
}
