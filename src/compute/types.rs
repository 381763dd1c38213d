use super::error::DispatchError;
use crate::membership::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Unique identifier of one broadcast. Every node execution of that broadcast shares it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The definition of a unit of work.
///
/// Closures cannot cross the network, so a task names a handler registered on every server
/// node and carries its arguments as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Task {
    Execute {
        /// The name of the registered handler to invoke (e.g., "scan_sum").
        handler: String,
        /// Arbitrary JSON payload passed to the handler function.
        payload: serde_json::Value,
    },
}

impl Task {
    pub fn handler(&self) -> &str {
        match self {
            Task::Execute { handler, .. } => handler,
        }
    }
}

/// What happened to a broadcast on one node.
#[derive(Debug, Clone)]
pub enum NodeOutcome {
    /// The node ran the task; `duration` is the node-reported execution time.
    Completed { duration: Duration },
    Failed(DispatchError),
    /// The caller's deadline passed first. The execution may still finish later.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct NodeResult {
    pub node_id: NodeId,
    pub outcome: NodeOutcome,
}

impl NodeResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, NodeOutcome::Completed { .. })
    }
}

/// The per-node results of one broadcast, in dispatch order.
#[derive(Debug, Clone)]
pub struct BroadcastReport {
    pub task_id: TaskId,
    pub results: Vec<NodeResult>,
}

impl BroadcastReport {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, NodeOutcome::Failed(_)))
            .count()
    }

    pub fn timed_out(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, NodeOutcome::TimedOut))
            .count()
    }
}
