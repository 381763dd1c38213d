use super::error::MembershipError;
use super::protocol::*;
use super::registry::NodeRegistry;

use axum::{Extension, Json, http::StatusCode};
use std::sync::Arc;

pub async fn handle_join(
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Json(req): Json<JoinRequest>,
) -> (StatusCode, Json<JoinResponse>) {
    match registry.join(req.node) {
        Ok(node_id) => (
            StatusCode::OK,
            Json(JoinResponse {
                node_id: Some(node_id),
                error: None,
            }),
        ),
        Err(e @ MembershipError::DuplicateNode(_)) => {
            tracing::warn!("Rejected join: {}", e);
            (
                StatusCode::CONFLICT,
                Json(JoinResponse {
                    node_id: None,
                    error: Some(e.to_string()),
                }),
            )
        }
        Err(e) => {
            tracing::error!("Failed to join: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(JoinResponse {
                    node_id: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_leave(
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Json(req): Json<NodeRequest>,
) -> (StatusCode, Json<AckResponse>) {
    ack(registry.leave(&req.node_id))
}

pub async fn handle_heartbeat(
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Json(req): Json<NodeRequest>,
) -> (StatusCode, Json<AckResponse>) {
    ack(registry.heartbeat(&req.node_id))
}

pub async fn handle_live(
    Extension(registry): Extension<Arc<NodeRegistry>>,
) -> Json<LiveMembersResponse> {
    Json(LiveMembersResponse {
        members: registry.list_live(),
    })
}

fn ack(result: Result<(), MembershipError>) -> (StatusCode, Json<AckResponse>) {
    match result {
        Ok(()) => (StatusCode::OK, Json(AckResponse { success: true })),
        Err(MembershipError::UnknownNode(node_id)) => {
            tracing::debug!("Request for unknown node {}", node_id);
            (StatusCode::NOT_FOUND, Json(AckResponse { success: false }))
        }
        Err(e) => {
            tracing::error!("Membership request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AckResponse { success: false }),
            )
        }
    }
}
