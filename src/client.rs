//! Client node bootstrap.
//!
//! A client hosts no data. It joins the cluster, then runs the cache updater and the compute
//! sender side by side until shutdown.

use crate::compute::broadcaster::TaskBroadcaster;
use crate::compute::dispatcher::HttpDispatcher;
use crate::config::ClientConfig;
use crate::load::sender::ComputeTasksSender;
use crate::load::updater::CacheUpdater;
use crate::membership::remote::RemoteMembership;
use crate::membership::service::{Membership, MembershipService};
use crate::membership::types::{Node, NodeId};
use crate::metrics::exporter::LogExporter;
use crate::metrics::registry::MetricsRegistry;
use crate::storage::cache::Cache;
use crate::storage::remote::RemoteCache;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-request limit for task delivery when rounds wait indefinitely.
const UNBOUNDED_DISPATCH_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn run(config: ClientConfig, shutdown: CancellationToken) -> Result<()> {
    let shutdown = shutdown.child_token();

    let node_id = config.node_id.clone().map(NodeId).unwrap_or_default();
    let metrics = MetricsRegistry::new(node_id.to_string());
    let backend: Arc<dyn Membership> = Arc::new(RemoteMembership::new(config.seed));

    let membership = MembershipService::join(
        Node::client(node_id),
        backend.clone(),
        config.heartbeat_interval(),
    )
    .await
    .with_context(|| format!("Failed to join the cluster via {}", config.seed))?;
    membership.clone().start(shutdown.clone()).await;

    let cache: Arc<dyn Cache> = Arc::new(RemoteCache::new(&config.cache, backend.clone()));
    let dispatcher = Arc::new(HttpDispatcher::new(
        config
            .broadcast_timeout()
            .unwrap_or(UNBOUNDED_DISPATCH_TIMEOUT),
    ));
    let broadcaster = TaskBroadcaster::new(backend, dispatcher, &metrics);

    tokio::spawn(
        LogExporter::new(metrics.clone(), config.metrics_log_interval()).run(shutdown.clone()),
    );

    let updater =
        tokio::spawn(CacheUpdater::new(cache, config.updater_settings()).run(shutdown.clone()));
    let sender = tokio::spawn(
        ComputeTasksSender::new(broadcaster, config.sender_settings()).run(shutdown.clone()),
    );

    tracing::info!("The client node is up and running");

    let (stats, rounds) = tokio::join!(updater, sender);
    let stats = stats.context("Cache updater task failed")?;
    let rounds = rounds.context("Compute sender task failed")?;

    tracing::info!(
        "Client finished: {} puts, {} gets ({} hits), {} errors, {} broadcast rounds",
        stats.puts,
        stats.gets,
        stats.hits,
        stats.errors,
        rounds
    );

    membership.leave().await;
    Ok(())
}
