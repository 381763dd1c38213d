//! Compute Network Protocol
//!
//! DTOs for running a broadcast task on a remote server node.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Runs one task on the receiving node and answers when it is done.
pub const ENDPOINT_EXECUTE: &str = "/compute/execute";

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub task_id: TaskId,
    pub task: Task,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub task_id: TaskId,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}
