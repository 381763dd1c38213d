//! Command-line configuration.
//!
//! Every option has a default, so both roles start without arguments. Each flag can also be
//! set through the environment variable named next to it.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;

use crate::load::sender::SenderSettings;
use crate::load::updater::UpdaterSettings;

pub const DEFAULT_SEED: &str = "127.0.0.1:47500";
pub const DEFAULT_CACHE_NAME: &str = "RecordsCache";

#[derive(Parser, Debug)]
#[command(author, version, about = "In-memory data grid with live metrics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a data-hosting server node. Run it several times to grow the cluster.
    Server(ServerConfig),
    /// Start a client node that drives cache and compute load.
    Client(ClientConfig),
}

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Address the node's HTTP endpoint binds to. Use port 0 for an ephemeral port.
    #[arg(long, env = "GRID_BIND", default_value = DEFAULT_SEED)]
    pub bind: SocketAddr,

    /// Seed node to join through. Without it this node becomes the seed.
    #[arg(long, env = "GRID_SEED")]
    pub seed: Option<SocketAddr>,

    /// Fixed node id. A random UUID is used if unset.
    #[arg(long, env = "GRID_NODE_ID")]
    pub node_id: Option<String>,

    /// How often gauges derived from node state are refreshed.
    #[arg(long, env = "GRID_METRICS_UPDATE_MS", default_value_t = 1000)]
    pub metrics_update_ms: u64,

    /// How often the metrics snapshot is written to the log.
    #[arg(long, env = "GRID_METRICS_LOG_MS", default_value_t = 5000)]
    pub metrics_log_ms: u64,

    #[arg(long, env = "GRID_HEARTBEAT_MS", default_value_t = 2000)]
    pub heartbeat_ms: u64,

    /// Members silent for longer than this are removed (seed only).
    #[arg(long, env = "GRID_LIVENESS_TIMEOUT_MS", default_value_t = 10_000)]
    pub liveness_timeout_ms: u64,
}

impl ServerConfig {
    pub fn metrics_update_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_update_ms.max(1))
    }

    pub fn metrics_log_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_log_ms.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms.max(1))
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 47500)),
            seed: None,
            node_id: None,
            metrics_update_ms: 1000,
            metrics_log_ms: 5000,
            heartbeat_ms: 2000,
            liveness_timeout_ms: 10_000,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClientConfig {
    /// Seed node to join through.
    #[arg(long, env = "GRID_SEED", default_value = DEFAULT_SEED)]
    pub seed: SocketAddr,

    #[arg(long, env = "GRID_NODE_ID")]
    pub node_id: Option<String>,

    #[arg(long, env = "GRID_CACHE", default_value = DEFAULT_CACHE_NAME)]
    pub cache: String,

    #[arg(long, env = "GRID_PUTS_PER_BURST", default_value_t = 1000)]
    pub puts_per_burst: usize,

    #[arg(long, env = "GRID_GETS_PER_BURST", default_value_t = 500)]
    pub gets_per_burst: usize,

    /// Keys are drawn uniformly from `0..key_space`.
    #[arg(long, env = "GRID_KEY_SPACE", default_value_t = 5000)]
    pub key_space: i64,

    /// Pause after each burst of puts or gets.
    #[arg(long, env = "GRID_PARK_MS", default_value_t = 2000)]
    pub park_ms: u64,

    /// Broadcasts issued together before waiting for all of them.
    #[arg(long, env = "GRID_BROADCASTS_PER_ROUND", default_value_t = 3)]
    pub broadcasts_per_round: usize,

    /// Per-round deadline for broadcast results. 0 waits indefinitely.
    #[arg(long, env = "GRID_BROADCAST_TIMEOUT_MS", default_value_t = 30_000)]
    pub broadcast_timeout_ms: u64,

    #[arg(long, env = "GRID_METRICS_LOG_MS", default_value_t = 5000)]
    pub metrics_log_ms: u64,

    #[arg(long, env = "GRID_HEARTBEAT_MS", default_value_t = 2000)]
    pub heartbeat_ms: u64,
}

impl ClientConfig {
    pub fn updater_settings(&self) -> UpdaterSettings {
        UpdaterSettings {
            puts_per_burst: self.puts_per_burst,
            gets_per_burst: self.gets_per_burst,
            key_space: self.key_space,
            park: Duration::from_millis(self.park_ms),
        }
    }

    pub fn sender_settings(&self) -> SenderSettings {
        SenderSettings {
            cache_name: self.cache.clone(),
            broadcasts_per_round: self.broadcasts_per_round,
            timeout: self.broadcast_timeout(),
            ..SenderSettings::default()
        }
    }

    pub fn broadcast_timeout(&self) -> Option<Duration> {
        (self.broadcast_timeout_ms > 0).then(|| Duration::from_millis(self.broadcast_timeout_ms))
    }

    pub fn metrics_log_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_log_ms.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms.max(1))
    }
}
