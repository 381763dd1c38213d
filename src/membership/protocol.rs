//! Membership Network Protocol
//!
//! Endpoints and DTOs served by the seed node for cluster membership.

use super::types::{Node, NodeId};
use serde::{Deserialize, Serialize};

/// Register a node. Answers `409 CONFLICT` if the identity is already live.
pub const ENDPOINT_JOIN: &str = "/membership/join";
/// Graceful departure. Answers `404 NOT_FOUND` for unknown nodes.
pub const ENDPOINT_LEAVE: &str = "/membership/leave";
/// Liveness refresh. Answers `404 NOT_FOUND` if the node was reaped and must re-join.
pub const ENDPOINT_HEARTBEAT: &str = "/membership/heartbeat";
/// Snapshot of all live members.
pub const ENDPOINT_LIVE: &str = "/membership/live";

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRequest {
    pub node: Node,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub node_id: Option<NodeId>,
    pub error: Option<String>,
}

/// Shared by leave and heartbeat.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeRequest {
    pub node_id: NodeId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LiveMembersResponse {
    pub members: Vec<Node>,
}
