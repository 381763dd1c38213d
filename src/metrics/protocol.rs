use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Endpoint serving the node's metrics snapshot.
pub const ENDPOINT_METRICS: &str = "/metrics";

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub namespace: String,
    pub metrics: BTreeMap<String, i64>,
}
