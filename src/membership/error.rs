use super::types::NodeId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MembershipError {
    /// The identity is already registered and has not left or expired.
    #[error("node {0} is already a live member of the cluster")]
    DuplicateNode(NodeId),

    #[error("node {0} is not a member of the cluster")]
    UnknownNode(NodeId),

    /// The membership backend could not be reached or answered garbage.
    #[error("membership transport error: {0}")]
    Transport(String),
}
