use super::error::MembershipError;
use super::types::{Node, NodeId};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// The membership backend seen by the rest of the system.
///
/// Implemented by the in-process `NodeRegistry` (seed node, tests) and by `RemoteMembership`
/// (every other node). A different discovery mechanism only needs to implement this trait.
#[async_trait]
pub trait Membership: Send + Sync {
    async fn join(&self, node: Node) -> Result<NodeId, MembershipError>;

    async fn leave(&self, node_id: &NodeId) -> Result<(), MembershipError>;

    async fn heartbeat(&self, node_id: &NodeId) -> Result<(), MembershipError>;

    /// Returns a snapshot of the live members; later membership changes do not affect it.
    async fn list_live(&self) -> Result<Vec<Node>, MembershipError>;
}

/// The local node's view of its own cluster membership.
///
/// Created by joining the cluster; keeps the membership alive through a heartbeat loop and
/// re-joins if the backend has expired it in the meantime.
pub struct MembershipService {
    pub local_node: Node,
    backend: Arc<dyn Membership>,
    heartbeat_interval: Duration,
}

impl MembershipService {
    /// Joins the cluster. Failure here is fatal for the node.
    pub async fn join(
        local_node: Node,
        backend: Arc<dyn Membership>,
        heartbeat_interval: Duration,
    ) -> Result<Arc<Self>, MembershipError> {
        let node_id = backend.join(local_node.clone()).await?;
        tracing::info!("Joined cluster as {} ({})", node_id, local_node.role);

        Ok(Arc::new(Self {
            local_node,
            backend,
            heartbeat_interval,
        }))
    }

    pub fn backend(&self) -> Arc<dyn Membership> {
        self.backend.clone()
    }

    pub fn local_id(&self) -> &NodeId {
        &self.local_node.id
    }

    pub async fn start(self: Arc<Self>, shutdown: CancellationToken) {
        tracing::info!(
            "Starting membership heartbeat every {:?}",
            self.heartbeat_interval
        );

        let service = self.clone();
        tokio::spawn(async move {
            service.heartbeat_loop(shutdown).await;
        });
    }

    pub async fn live_members(&self) -> Result<Vec<Node>, MembershipError> {
        self.backend.list_live().await
    }

    pub async fn live_servers(&self) -> Result<Vec<Node>, MembershipError> {
        Ok(self
            .backend
            .list_live()
            .await?
            .into_iter()
            .filter(|node| node.is_server())
            .collect())
    }

    /// Graceful departure. Errors are logged, not returned: the node is going away anyway.
    pub async fn leave(&self) {
        match self.backend.leave(&self.local_node.id).await {
            Ok(()) => tracing::info!("Left the cluster"),
            Err(e) => tracing::warn!("Failed to leave the cluster cleanly: {}", e),
        }
    }

    async fn heartbeat_loop(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.heartbeat_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    self.heartbeat_once().await;
                }
            }
        }

        tracing::debug!("Heartbeat loop stopped");
    }

    async fn heartbeat_once(&self) {
        match self.backend.heartbeat(&self.local_node.id).await {
            Ok(()) => {
                tracing::trace!("Heartbeat acknowledged");
            }
            Err(MembershipError::UnknownNode(_)) => {
                tracing::warn!("Membership expired, re-joining the cluster");
                if let Err(e) = self.backend.join(self.local_node.clone()).await {
                    tracing::error!("Failed to re-join the cluster: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Heartbeat failed: {}", e);
            }
        }
    }
}
