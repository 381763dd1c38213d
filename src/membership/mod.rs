//! Membership & Discovery Module
//!
//! Tracks which nodes have joined the cluster and which of them are still alive.
//!
//! ## Core Mechanisms
//! - **Seed Registry**: The first server node (started without `--seed`) owns the authoritative
//!   `NodeRegistry`. Every other node joins, heartbeats and leaves through its HTTP endpoints.
//! - **Liveness**: Members heartbeat periodically; the seed reaps members whose last heartbeat is
//!   older than the liveness timeout. A reaped node that is still running re-joins on its next
//!   heartbeat.
//! - **Snapshots**: `list_live` always returns a copy, so callers fanning out work iterate over a
//!   stable member list even while the cluster changes.
//! - **Pluggable Backend**: Everything above the registry talks to the `Membership` trait, so the
//!   local registry and the HTTP client are interchangeable.

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod remote;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
