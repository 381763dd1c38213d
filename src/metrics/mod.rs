//! Metrics Module
//!
//! A small in-process metrics registry that every other subsystem reports into.
//! Nothing in here knows about caches or compute jobs; callers pick the metric names.
//!
//! ## Core Concepts
//! - **Counters**: Monotonic, lock-free `u64` counters (`cache.RecordsCache.puts`, ...).
//! - **Gauges**: Point-in-time `i64` values (`compute.jobs.active`, `cluster.nodes.live`, ...).
//! - **Snapshot**: A sorted name -> value map handed to exporters. Reads of a single metric are
//!   never torn; reads across metrics are not coordinated.
//! - **Exporters**: `LogExporter` periodically writes the snapshot through `tracing`, and the
//!   `/metrics` HTTP endpoint serves it on demand.

pub mod exporter;
pub mod handlers;
pub mod protocol;
pub mod registry;

#[cfg(test)]
mod tests;
