//! Built-in task handlers.

use super::registry::TaskHandlerRegistry;
use super::types::Task;
use crate::storage::manager::CacheManager;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SCAN_SUM_HANDLER: &str = "scan_sum";

#[derive(Debug, Serialize, Deserialize)]
pub struct ScanSumPayload {
    pub cache: String,
}

/// Builds a task that sums every value of `cache` on each node it runs on.
pub fn scan_sum_task(cache: &str) -> Task {
    Task::Execute {
        handler: SCAN_SUM_HANDLER.to_string(),
        payload: serde_json::json!({ "cache": cache }),
    }
}

/// Registers the `scan_sum` handler against this node's caches.
///
/// The sum has no consumer; the job exists to generate scan and compute load. A cache this
/// node has never seen scans as empty.
pub fn register_scan_sum(registry: &TaskHandlerRegistry, caches: Arc<CacheManager>) {
    registry.register(SCAN_SUM_HANDLER, move |task| {
        let caches = caches.clone();
        async move {
            let Task::Execute { payload, .. } = task;
            let payload: ScanSumPayload = serde_json::from_value(payload)?;

            let sum = caches
                .get(&payload.cache)
                .map(|cache| cache.scan_sum())
                .unwrap_or(0);
            tracing::debug!("scan_sum over {} = {}", payload.cache, sum);

            Ok::<(), anyhow::Error>(())
        }
    });
}
