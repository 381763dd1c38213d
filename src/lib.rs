//! In-Memory Data Grid with Live Metrics
//!
//! This library crate defines the modules that make up a grid node. The binary (`main.rs`)
//! starts either a server node or a load-driving client node on top of them.
//!
//! ## Architecture Modules
//!
//! - **`membership`**: Cluster coordination. The seed node hosts the `NodeRegistry`; every other
//!   node joins, heartbeats and leaves through `RemoteMembership` over HTTP.
//! - **`storage`**: Named key-value caches (`KeyValueStore`) hosted by server nodes, plus the
//!   partition-routed `RemoteCache` used by clients.
//! - **`compute`**: Task broadcasting. `TaskBroadcaster` fans a task out to every live server
//!   and collects one outcome per node; `JobExecutor` runs it on the receiving side.
//! - **`metrics`**: Named counters and gauges with a periodic log exporter and an HTTP snapshot.
//! - **`load`**: The cache updater and compute sender that generate traffic from client nodes.
//! - **`server`** / **`client`**: Process bootstrap for the two node roles.

pub mod client;
pub mod compute;
pub mod config;
pub mod load;
pub mod membership;
pub mod metrics;
pub mod server;
pub mod storage;
pub mod transport;
