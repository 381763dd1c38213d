//! Task delivery to server nodes.

use super::error::DispatchError;
use super::executor::JobExecutor;
use super::protocol::*;
use super::types::*;
use crate::membership::types::{Node, NodeId};
use crate::transport::{DEFAULT_ATTEMPTS, post_with_retry};

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Delivers a task to one node and reports how long the node spent executing it.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        node: &Node,
        task_id: &TaskId,
        task: &Task,
    ) -> Result<Duration, DispatchError>;
}

/// Sends tasks to `POST /compute/execute` on the target node.
///
/// Connection errors are retried, so a task may run more than once on a node whose answer
/// got lost.
pub struct HttpDispatcher {
    http_client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpDispatcher {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            request_timeout,
        }
    }
}

#[async_trait]
impl TaskDispatcher for HttpDispatcher {
    async fn dispatch(
        &self,
        node: &Node,
        task_id: &TaskId,
        task: &Task,
    ) -> Result<Duration, DispatchError> {
        let addr = node
            .addr
            .ok_or_else(|| DispatchError::NoAddress(node.id.clone()))?;
        let url = format!("http://{}{}", addr, ENDPOINT_EXECUTE);
        let payload = ExecuteRequest {
            task_id: task_id.clone(),
            task: task.clone(),
        };

        let response = post_with_retry(
            &self.http_client,
            &url,
            &payload,
            self.request_timeout,
            DEFAULT_ATTEMPTS,
        )
        .await
        .map_err(|e| DispatchError::Unreachable {
            node: node.id.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            let body: ExecuteResponse =
                response
                    .json()
                    .await
                    .map_err(|e| DispatchError::Unreachable {
                        node: node.id.clone(),
                        reason: format!("invalid response: {}", e),
                    })?;
            return Ok(Duration::from_millis(body.duration_ms));
        }

        if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
            && let Ok(body) = response.json::<ExecuteResponse>().await
            && let Some(reason) = body.error
        {
            return Err(DispatchError::Execution {
                node: node.id.clone(),
                reason,
            });
        }

        Err(DispatchError::Rejected {
            node: node.id.clone(),
            status: status.as_u16(),
        })
    }
}

/// Runs tasks on executors living in the same process, keyed by node id.
///
/// Lets a whole cluster run inside one process; nodes without an attached executor are
/// reported as unreachable.
#[derive(Default)]
pub struct LocalDispatcher {
    executors: DashMap<NodeId, Arc<JobExecutor>>,
}

impl LocalDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attach(&self, node_id: NodeId, executor: Arc<JobExecutor>) {
        self.executors.insert(node_id, executor);
    }
}

#[async_trait]
impl TaskDispatcher for LocalDispatcher {
    async fn dispatch(
        &self,
        node: &Node,
        task_id: &TaskId,
        task: &Task,
    ) -> Result<Duration, DispatchError> {
        let executor = self
            .executors
            .get(&node.id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::Unreachable {
                node: node.id.clone(),
                reason: "no executor attached".to_string(),
            })?;

        executor
            .execute(task_id, task)
            .await
            .map_err(|e| DispatchError::Execution {
                node: node.id.clone(),
                reason: e.to_string(),
            })
    }
}
