use super::dispatcher::TaskDispatcher;
use super::error::DispatchError;
use super::types::*;
use crate::membership::error::MembershipError;
use crate::membership::service::Membership;
use crate::membership::types::NodeId;
use crate::metrics::registry::{Counter, Gauge, MetricsRegistry};

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Clone)]
struct BroadcastMetrics {
    broadcasts: Counter,
    failures: Counter,
    timeouts: Counter,
    active: Gauge,
}

/// Keeps `compute.broadcasts.active` accurate even if a `PendingBroadcast` is dropped unawaited.
struct ActiveBroadcast(Gauge);

impl ActiveBroadcast {
    fn enter(gauge: &Gauge) -> Self {
        gauge.add(1);
        Self(gauge.clone())
    }
}

impl Drop for ActiveBroadcast {
    fn drop(&mut self) {
        self.0.add(-1);
    }
}

struct Execution {
    node_id: NodeId,
    handle: JoinHandle<Result<Duration, DispatchError>>,
}

/// Sends a task to every live server node.
pub struct TaskBroadcaster {
    membership: Arc<dyn Membership>,
    dispatcher: Arc<dyn TaskDispatcher>,
    metrics: BroadcastMetrics,
}

impl TaskBroadcaster {
    pub fn new(
        membership: Arc<dyn Membership>,
        dispatcher: Arc<dyn TaskDispatcher>,
        registry: &MetricsRegistry,
    ) -> Arc<Self> {
        Arc::new(Self {
            membership,
            dispatcher,
            metrics: BroadcastMetrics {
                broadcasts: registry.counter("compute.broadcasts"),
                failures: registry.counter("compute.dispatch.failures"),
                timeouts: registry.counter("compute.dispatch.timeouts"),
                active: registry.gauge("compute.broadcasts.active"),
            },
        })
    }

    /// Starts `task` on every server node that is live right now.
    ///
    /// All executions are already running when this returns. Only a failed membership lookup
    /// is an error; with no live servers the result is an already-complete empty broadcast.
    pub async fn broadcast(&self, task: Task) -> Result<PendingBroadcast, MembershipError> {
        let targets: Vec<_> = self
            .membership
            .list_live()
            .await?
            .into_iter()
            .filter(|node| node.is_server())
            .collect();

        let task_id = TaskId::new();
        let active = ActiveBroadcast::enter(&self.metrics.active);
        self.metrics.broadcasts.increment(1);

        tracing::debug!(
            "Broadcasting task {} ({}) to {} node(s)",
            task_id,
            task.handler(),
            targets.len()
        );

        let task = Arc::new(task);
        let mut executions = Vec::with_capacity(targets.len());
        for node in targets {
            let node_id = node.id.clone();
            let dispatcher = self.dispatcher.clone();
            let task = task.clone();
            let task_id = task_id.clone();

            let handle =
                tokio::spawn(async move { dispatcher.dispatch(&node, &task_id, &task).await });
            executions.push(Execution { node_id, handle });
        }

        Ok(PendingBroadcast {
            task_id,
            executions,
            metrics: self.metrics.clone(),
            _active: active,
        })
    }

    pub async fn broadcast_and_wait(
        &self,
        task: Task,
        timeout: Option<Duration>,
    ) -> Result<BroadcastReport, MembershipError> {
        Ok(self.broadcast(task).await?.await_all(timeout).await)
    }
}

/// A broadcast whose node executions are in flight.
pub struct PendingBroadcast {
    task_id: TaskId,
    executions: Vec<Execution>,
    metrics: BroadcastMetrics,
    _active: ActiveBroadcast,
}

impl PendingBroadcast {
    pub fn node_count(&self) -> usize {
        self.executions.len()
    }

    /// Waits until every node has reported or `timeout` has elapsed, whichever comes first.
    ///
    /// Returns exactly one result per dispatched node. Executions that miss the deadline are
    /// reported as `TimedOut` and detached rather than aborted.
    pub async fn await_all(self, timeout: Option<Duration>) -> BroadcastReport {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        self.await_until(deadline).await
    }

    /// Like `await_all`, against an absolute deadline shared with other broadcasts.
    pub async fn await_until(self, deadline: Option<Instant>) -> BroadcastReport {
        let mut results = Vec::with_capacity(self.executions.len());

        for Execution {
            node_id,
            mut handle,
        } in self.executions
        {
            let joined = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, &mut handle).await.ok(),
                None => Some((&mut handle).await),
            };

            let outcome = match joined {
                Some(Ok(Ok(duration))) => NodeOutcome::Completed { duration },
                Some(Ok(Err(e))) => {
                    self.metrics.failures.increment(1);
                    tracing::warn!("Task {}: {}", self.task_id, e);
                    NodeOutcome::Failed(e)
                }
                Some(Err(join_error)) => {
                    self.metrics.failures.increment(1);
                    let e = DispatchError::Panicked {
                        node: node_id.clone(),
                        reason: join_error.to_string(),
                    };
                    tracing::error!("Task {}: {}", self.task_id, e);
                    NodeOutcome::Failed(e)
                }
                None => {
                    // Dropping the handle detaches the execution; it keeps running.
                    self.metrics.timeouts.increment(1);
                    tracing::warn!("Task {} timed out on node {}", self.task_id, node_id);
                    NodeOutcome::TimedOut
                }
            };

            results.push(NodeResult { node_id, outcome });
        }

        BroadcastReport {
            task_id: self.task_id,
            results,
        }
    }
}
