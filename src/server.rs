//! Server node bootstrap.
//!
//! Wires membership, caches, compute execution and metrics exporters into one HTTP node.

use crate::compute::executor::JobExecutor;
use crate::compute::handlers::handle_execute;
use crate::compute::jobs::register_scan_sum;
use crate::compute::protocol::ENDPOINT_EXECUTE;
use crate::compute::registry::TaskHandlerRegistry;
use crate::config::ServerConfig;
use crate::membership::handlers::{handle_heartbeat, handle_join, handle_leave, handle_live};
use crate::membership::protocol::{ENDPOINT_HEARTBEAT, ENDPOINT_JOIN, ENDPOINT_LEAVE, ENDPOINT_LIVE};
use crate::membership::registry::NodeRegistry;
use crate::membership::remote::RemoteMembership;
use crate::membership::service::{Membership, MembershipService};
use crate::membership::types::{Node, NodeId};
use crate::metrics::exporter::LogExporter;
use crate::metrics::handlers::handle_metrics;
use crate::metrics::protocol::ENDPOINT_METRICS;
use crate::metrics::registry::MetricsRegistry;
use crate::storage::handlers::{handle_get, handle_put, handle_size};
use crate::storage::manager::CacheManager;
use crate::storage::protocol::ENDPOINT_CACHE;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Builds the HTTP surface of a server node. Membership routes exist only on the seed.
pub fn router(
    caches: Arc<CacheManager>,
    executor: Arc<JobExecutor>,
    metrics: Arc<MetricsRegistry>,
    seed_registry: Option<Arc<NodeRegistry>>,
) -> Router {
    let mut app = Router::new()
        .route(&format!("{}/:name/put", ENDPOINT_CACHE), post(handle_put))
        .route(&format!("{}/:name/get/:key", ENDPOINT_CACHE), get(handle_get))
        .route(&format!("{}/:name/size", ENDPOINT_CACHE), get(handle_size))
        .route(ENDPOINT_EXECUTE, post(handle_execute))
        .route(ENDPOINT_METRICS, get(handle_metrics));

    if let Some(registry) = seed_registry {
        app = app
            .route(ENDPOINT_JOIN, post(handle_join))
            .route(ENDPOINT_LEAVE, post(handle_leave))
            .route(ENDPOINT_HEARTBEAT, post(handle_heartbeat))
            .route(ENDPOINT_LIVE, get(handle_live))
            .layer(Extension(registry));
    }

    app.layer(Extension(caches))
        .layer(Extension(executor))
        .layer(Extension(metrics))
}

pub struct ServerNode {
    pub membership: Arc<MembershipService>,
    pub caches: Arc<CacheManager>,
    pub metrics: Arc<MetricsRegistry>,
    seed_registry: Option<Arc<NodeRegistry>>,
    addr: SocketAddr,
    shutdown: CancellationToken,
    http: JoinHandle<std::io::Result<()>>,
}

impl ServerNode {
    /// Binds, starts serving and joins the cluster.
    ///
    /// Fails if the address is taken, the seed is unreachable or the node id is already live.
    pub async fn start(config: ServerConfig, shutdown: CancellationToken) -> Result<Self> {
        let shutdown = shutdown.child_token();

        let listener = TcpListener::bind(config.bind)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind))?;
        let addr = listener.local_addr()?;

        let node_id = config.node_id.clone().map(NodeId).unwrap_or_default();
        let local_node = Node::server(node_id.clone(), addr);
        tracing::info!("Starting server node {} on {}", node_id, addr);

        // 1. Metrics & storage:
        let metrics = MetricsRegistry::new(node_id.to_string());
        let caches = CacheManager::new(metrics.clone());

        // 2. Compute:
        let handlers = TaskHandlerRegistry::new();
        register_scan_sum(&handlers, caches.clone());
        tracing::info!("Task handlers: {}", handlers.names().join(", "));
        let executor = JobExecutor::new(handlers, &metrics);

        // 3. Membership backend:
        let (seed_registry, backend): (Option<Arc<NodeRegistry>>, Arc<dyn Membership>) =
            match config.seed {
                None => {
                    tracing::info!("Starting as seed node (founder)");
                    let registry = NodeRegistry::new();
                    let backend: Arc<dyn Membership> = registry.clone();
                    (Some(registry), backend)
                }
                Some(seed) => {
                    tracing::info!("Seed node: {}", seed);
                    let backend: Arc<dyn Membership> = Arc::new(RemoteMembership::new(seed));
                    (None, backend)
                }
            };

        // 4. HTTP server, up before joining so peers can reach us as soon as we are listed:
        let app = router(
            caches.clone(),
            executor,
            metrics.clone(),
            seed_registry.clone(),
        );
        let http = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move { shutdown.cancelled().await })
                    .await
            })
        };

        // 5. Join:
        let membership =
            match MembershipService::join(local_node, backend, config.heartbeat_interval()).await {
                Ok(membership) => membership,
                Err(e) => {
                    shutdown.cancel();
                    return Err(e).context("Failed to join the cluster");
                }
            };
        membership.clone().start(shutdown.clone()).await;

        // 6. Background tasks:
        if let Some(registry) = seed_registry.clone() {
            tokio::spawn(registry.reaper_loop(
                config.liveness_timeout(),
                config.heartbeat_interval(),
                shutdown.clone(),
            ));
        }

        tokio::spawn(
            LogExporter::new(metrics.clone(), config.metrics_log_interval()).run(shutdown.clone()),
        );

        tokio::spawn(refresh_loop(
            membership.clone(),
            caches.clone(),
            metrics.clone(),
            config.metrics_update_interval(),
            shutdown.clone(),
        ));

        tracing::info!("The server node is up and running");

        Ok(Self {
            membership,
            caches,
            metrics,
            seed_registry,
            addr,
            shutdown,
            http,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn node_id(&self) -> &NodeId {
        self.membership.local_id()
    }

    pub fn is_seed(&self) -> bool {
        self.seed_registry.is_some()
    }

    /// Stops this node. `wait` returns once the HTTP server has drained.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Runs until shutdown, then leaves the cluster.
    pub async fn wait(self) -> Result<()> {
        let is_seed = self.is_seed();
        let Self {
            membership, http, ..
        } = self;

        let served = http.await.context("HTTP server task failed")?;

        if !is_seed {
            membership.leave().await;
        }
        tracing::info!("Server node {} stopped", membership.local_id());

        served.context("HTTP server error")
    }
}

/// Refreshes the gauges that mirror node state.
async fn refresh_loop(
    membership: Arc<MembershipService>,
    caches: Arc<CacheManager>,
    metrics: Arc<MetricsRegistry>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let live_nodes = metrics.gauge("cluster.nodes.live");
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                caches.refresh_gauges();
                match membership.live_members().await {
                    Ok(members) => live_nodes.set(members.len() as i64),
                    Err(e) => tracing::debug!("Could not refresh membership gauge: {}", e),
                }
            }
        }
    }
}
