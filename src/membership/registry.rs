//! Node Registry
//!
//! The authoritative member table, hosted by the seed node. Membership is a plain
//! `NodeId -> MemberRecord` map: a node is live for as long as it has a record.

use super::error::MembershipError;
use super::service::Membership;
use super::types::{Node, NodeId};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct MemberRecord {
    node: Node,
    last_seen: Instant,
}

#[derive(Default)]
pub struct NodeRegistry {
    members: DashMap<NodeId, MemberRecord>,
}

impl NodeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `node`. Fails with `DuplicateNode` while the same identity is still live.
    pub fn join(&self, node: Node) -> Result<NodeId, MembershipError> {
        match self.members.entry(node.id.clone()) {
            Entry::Occupied(_) => Err(MembershipError::DuplicateNode(node.id)),
            Entry::Vacant(vacant) => {
                let id = node.id.clone();
                tracing::info!("Node {} ({}) joined the cluster", id, node.role);
                vacant.insert(MemberRecord {
                    node,
                    last_seen: Instant::now(),
                });
                tracing::info!("Cluster size now: {}", self.members.len());
                Ok(id)
            }
        }
    }

    pub fn leave(&self, node_id: &NodeId) -> Result<(), MembershipError> {
        match self.members.remove(node_id) {
            Some(_) => {
                tracing::info!(
                    "Node {} left the cluster (size now: {})",
                    node_id,
                    self.members.len()
                );
                Ok(())
            }
            None => Err(MembershipError::UnknownNode(node_id.clone())),
        }
    }

    /// Refreshes the liveness timestamp of a member.
    pub fn heartbeat(&self, node_id: &NodeId) -> Result<(), MembershipError> {
        match self.members.get_mut(node_id) {
            Some(mut record) => {
                record.last_seen = Instant::now();
                Ok(())
            }
            None => Err(MembershipError::UnknownNode(node_id.clone())),
        }
    }

    /// Snapshot of all live members, ordered by id.
    pub fn list_live(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .members
            .iter()
            .map(|entry| entry.value().node.clone())
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    pub fn live_servers(&self) -> Vec<Node> {
        self.list_live()
            .into_iter()
            .filter(|node| node.is_server())
            .collect()
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.members.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Removes every member whose last heartbeat is older than `timeout` and returns them.
    pub fn reap_expired(&self, timeout: Duration) -> Vec<Node> {
        let expired: Vec<NodeId> = self
            .members
            .iter()
            .filter(|entry| entry.value().last_seen.elapsed() > timeout)
            .map(|entry| entry.key().clone())
            .collect();

        let mut reaped = Vec::new();
        for node_id in expired {
            // Re-check under the shard lock: a heartbeat may have landed since the scan.
            if let Some((_, record)) = self
                .members
                .remove_if(&node_id, |_, record| record.last_seen.elapsed() > timeout)
            {
                tracing::warn!(
                    "Node {} declared dead (no heartbeat for {:?})",
                    node_id,
                    record.last_seen.elapsed()
                );
                reaped.push(record.node);
            }
        }

        if !reaped.is_empty() {
            tracing::info!("Cluster size now: {} live nodes", self.members.len());
        }

        reaped
    }

    /// Runs `reap_expired` every `period` until `shutdown` is cancelled.
    pub async fn reaper_loop(
        self: Arc<Self>,
        timeout: Duration,
        period: Duration,
        shutdown: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    self.reap_expired(timeout);
                }
            }
        }

        tracing::debug!("Membership reaper stopped");
    }
}

#[async_trait]
impl Membership for NodeRegistry {
    async fn join(&self, node: Node) -> Result<NodeId, MembershipError> {
        NodeRegistry::join(self, node)
    }

    async fn leave(&self, node_id: &NodeId) -> Result<(), MembershipError> {
        NodeRegistry::leave(self, node_id)
    }

    async fn heartbeat(&self, node_id: &NodeId) -> Result<(), MembershipError> {
        NodeRegistry::heartbeat(self, node_id)
    }

    async fn list_live(&self) -> Result<Vec<Node>, MembershipError> {
        Ok(NodeRegistry::list_live(self))
    }
}
