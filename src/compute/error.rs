use crate::membership::types::NodeId;
use thiserror::Error;

/// Failure of one node's execution. Collected per node, never raised for the whole broadcast.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("node {0} does not advertise an address")]
    NoAddress(NodeId),

    #[error("node {node} is unreachable: {reason}")]
    Unreachable { node: NodeId, reason: String },

    #[error("node {node} rejected the task with status {status}")]
    Rejected { node: NodeId, status: u16 },

    /// The node ran the handler and it returned an error.
    #[error("task failed on node {node}: {reason}")]
    Execution { node: NodeId, reason: String },

    #[error("dispatch to node {node} panicked: {reason}")]
    Panicked { node: NodeId, reason: String },
}
