//! HTTP client for the seed node's membership endpoints.

use super::error::MembershipError;
use super::protocol::*;
use super::service::Membership;
use super::types::{Node, NodeId};
use crate::transport::{DEFAULT_ATTEMPTS, DEFAULT_TIMEOUT, get_with_retry, post_with_retry};

use async_trait::async_trait;
use reqwest::StatusCode;
use std::net::SocketAddr;

pub struct RemoteMembership {
    seed: SocketAddr,
    http_client: reqwest::Client,
}

impl RemoteMembership {
    pub fn new(seed: SocketAddr) -> Self {
        Self {
            seed,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("http://{}{}", self.seed, endpoint)
    }

    async fn post_node_request(
        &self,
        endpoint: &str,
        node_id: &NodeId,
    ) -> Result<(), MembershipError> {
        let payload = NodeRequest {
            node_id: node_id.clone(),
        };
        let response = post_with_retry(
            &self.http_client,
            &self.url(endpoint),
            &payload,
            DEFAULT_TIMEOUT,
            DEFAULT_ATTEMPTS,
        )
        .await
        .map_err(transport)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(MembershipError::UnknownNode(node_id.clone())),
            status => Err(MembershipError::Transport(format!(
                "{} answered {}",
                endpoint, status
            ))),
        }
    }
}

#[async_trait]
impl Membership for RemoteMembership {
    async fn join(&self, node: Node) -> Result<NodeId, MembershipError> {
        let node_id = node.id.clone();
        let response = post_with_retry(
            &self.http_client,
            &self.url(ENDPOINT_JOIN),
            &JoinRequest { node: node.clone() },
            DEFAULT_TIMEOUT,
            DEFAULT_ATTEMPTS,
        )
        .await
        .map_err(transport)?;

        if response.status() == StatusCode::CONFLICT {
            // A retried join conflicts with its own earlier attempt if only the answer was lost.
            // That registration carries the exact same node record, join timestamp included.
            let live = self.list_live().await?;
            if live.contains(&node) {
                tracing::debug!("Join of {} already registered by an earlier attempt", node_id);
                return Ok(node_id);
            }
            return Err(MembershipError::DuplicateNode(node_id));
        }
        if !response.status().is_success() {
            return Err(MembershipError::Transport(format!(
                "join answered {}",
                response.status()
            )));
        }

        let body: JoinResponse = response.json().await.map_err(transport)?;
        body.node_id
            .ok_or_else(|| MembershipError::Transport("join response without node id".into()))
    }

    async fn leave(&self, node_id: &NodeId) -> Result<(), MembershipError> {
        self.post_node_request(ENDPOINT_LEAVE, node_id).await
    }

    async fn heartbeat(&self, node_id: &NodeId) -> Result<(), MembershipError> {
        self.post_node_request(ENDPOINT_HEARTBEAT, node_id).await
    }

    async fn list_live(&self) -> Result<Vec<Node>, MembershipError> {
        let response = get_with_retry(
            &self.http_client,
            &self.url(ENDPOINT_LIVE),
            DEFAULT_TIMEOUT,
            DEFAULT_ATTEMPTS,
        )
        .await
        .map_err(transport)?;

        if !response.status().is_success() {
            return Err(MembershipError::Transport(format!(
                "live members answered {}",
                response.status()
            )));
        }

        let body: LiveMembersResponse = response.json().await.map_err(transport)?;
        Ok(body.members)
    }
}

fn transport(e: impl std::fmt::Display) -> MembershipError {
    MembershipError::Transport(e.to_string())
}
