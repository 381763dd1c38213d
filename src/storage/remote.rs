//! Client-side cache access.
//!
//! `RemoteCache` routes each key to the server that owns its partition. The list of live
//! servers is cached for `TOPOLOGY_TTL` and dropped after any failed request, so topology
//! changes are picked up within a second or on the first error.

use super::cache::Cache;
use super::partitioner::PartitionManager;
use super::protocol::*;
use crate::membership::service::Membership;
use crate::membership::types::Node;
use crate::transport::{DEFAULT_ATTEMPTS, DEFAULT_TIMEOUT, get_with_retry, post_with_retry};

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const TOPOLOGY_TTL: Duration = Duration::from_secs(1);

struct Topology {
    servers: Arc<Vec<Node>>,
    fetched_at: Option<Instant>,
}

pub struct RemoteCache {
    name: String,
    membership: Arc<dyn Membership>,
    partitioner: PartitionManager,
    topology: RwLock<Topology>,
    http_client: reqwest::Client,
}

impl RemoteCache {
    pub fn new(name: &str, membership: Arc<dyn Membership>) -> Self {
        Self {
            name: name.to_string(),
            membership,
            partitioner: PartitionManager::new(),
            topology: RwLock::new(Topology {
                servers: Arc::new(Vec::new()),
                fetched_at: None,
            }),
            http_client: reqwest::Client::new(),
        }
    }

    async fn servers(&self) -> Result<Arc<Vec<Node>>> {
        {
            let topology = self.topology.read().await;
            if let Some(fetched_at) = topology.fetched_at
                && fetched_at.elapsed() < TOPOLOGY_TTL
                && !topology.servers.is_empty()
            {
                return Ok(topology.servers.clone());
            }
        }

        let servers: Vec<Node> = self
            .membership
            .list_live()
            .await?
            .into_iter()
            .filter(|node| node.is_server())
            .collect();
        let servers = Arc::new(servers);

        let mut topology = self.topology.write().await;
        topology.servers = servers.clone();
        topology.fetched_at = Some(Instant::now());

        tracing::debug!("Refreshed topology: {} server(s)", servers.len());
        Ok(servers)
    }

    async fn invalidate(&self) {
        self.topology.write().await.fetched_at = None;
    }

    async fn owner_url(&self, key: i64, path: &str) -> Result<String> {
        let servers = self.servers().await?;
        let owner = self
            .partitioner
            .owner_of(key, &servers)
            .ok_or_else(|| anyhow::anyhow!("No live server nodes to route key {}", key))?;
        let addr = owner
            .addr
            .ok_or_else(|| anyhow::anyhow!("Server {} has no address", owner.id))?;

        Ok(format!("http://{}{}", addr, path))
    }

    async fn try_put(&self, key: i64, value: i64) -> Result<()> {
        let url = self.owner_url(key, &put_path(&self.name)).await?;
        let response = post_with_retry(
            &self.http_client,
            &url,
            &PutRequest { key, value },
            DEFAULT_TIMEOUT,
            DEFAULT_ATTEMPTS,
        )
        .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("PUT failed {}", response.status()));
        }
        Ok(())
    }

    async fn try_get(&self, key: i64) -> Result<Option<i64>> {
        let url = self.owner_url(key, &get_path(&self.name, key)).await?;
        let response =
            get_with_retry(&self.http_client, &url, DEFAULT_TIMEOUT, DEFAULT_ATTEMPTS).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("GET failed {}", response.status()));
        }

        let body: GetResponse = response.json().await?;
        Ok(body.value)
    }
}

#[async_trait]
impl Cache for RemoteCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: i64, value: i64) -> Result<()> {
        let result = self.try_put(key, value).await;
        if result.is_err() {
            self.invalidate().await;
        }
        result
    }

    async fn get(&self, key: i64) -> Result<Option<i64>> {
        let result = self.try_get(key).await;
        if result.is_err() {
            self.invalidate().await;
        }
        result
    }
}
