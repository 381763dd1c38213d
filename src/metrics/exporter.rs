use super::registry::MetricsRegistry;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodically writes the full metrics snapshot to the log.
pub struct LogExporter {
    registry: Arc<MetricsRegistry>,
    period: Duration,
}

impl LogExporter {
    pub fn new(registry: Arc<MetricsRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            "Metrics log exporter started (period {:?}, namespace {})",
            self.period,
            self.registry.namespace()
        );

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately and there is nothing worth reporting yet.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    self.export();
                }
            }
        }

        tracing::info!("Metrics log exporter stopped");
    }

    /// Logs one snapshot and returns the number of metrics written.
    pub fn export(&self) -> usize {
        let snapshot = self.registry.snapshot();

        tracing::info!(
            "Metrics for {} ({} entries)",
            self.registry.namespace(),
            snapshot.len()
        );
        for (name, value) in snapshot.iter() {
            tracing::info!("  - {} = {}", name, value);
        }

        snapshot.len()
    }
}
