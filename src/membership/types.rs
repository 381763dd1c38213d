use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a node hosts data and executes compute jobs (`Server`) or only issues requests
/// (`Client`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Server,
    Client,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Server => f.write_str("server"),
            NodeRole::Client => f.write_str("client"),
        }
    }
}

/// Represents a single member in the cluster.
///
/// `addr` is the node's HTTP address. Server nodes always advertise one; client nodes do not
/// accept requests and leave it empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub role: NodeRole,
    pub addr: Option<SocketAddr>,
    /// Timestamp (ms) when the node joined.
    pub joined_at: u64,
}

impl Node {
    pub fn server(id: NodeId, addr: SocketAddr) -> Self {
        Self {
            id,
            role: NodeRole::Server,
            addr: Some(addr),
            joined_at: now_ms(),
        }
    }

    pub fn client(id: NodeId) -> Self {
        Self {
            id,
            role: NodeRole::Client,
            addr: None,
            joined_at: now_ms(),
        }
    }

    pub fn is_server(&self) -> bool {
        self.role == NodeRole::Server
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
