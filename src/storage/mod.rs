//! Storage Module
//!
//! Implements the named in-memory caches hosted by server nodes.
//!
//! ## Core Concepts
//! - **KeyValueStore**: One named `i64 -> i64` cache on top of a sharded `DashMap`. Writes to a
//!   key are serialized by its shard lock; nothing locks the whole map.
//! - **Counters**: Every store reports `puts`, `gets`, `hits`, `misses` and `scans` into the
//!   node's `MetricsRegistry` under `cache.<name>.*`.
//! - **Scans**: `scan_sum` covers exactly the keys that existed when the scan started.
//! - **Routing**: Clients pick the owning server with `PartitionManager` and talk to it through
//!   `RemoteCache`; both local and remote caches implement the `Cache` trait.

pub mod cache;
pub mod handlers;
pub mod manager;
pub mod partitioner;
pub mod protocol;
pub mod remote;
pub mod store;

#[cfg(test)]
mod tests;
