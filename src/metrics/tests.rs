//! Metrics Module Tests
//!
//! ## Test Scopes
//! - **Counters/Gauges**: Handle sharing, atomic increments under contention.
//! - **Snapshot**: Contents and ordering of the exported map.
//! - **Exporter**: The log exporter reports every metric and stops on cancellation.

#[cfg(test)]
mod tests {
    use crate::metrics::exporter::LogExporter;
    use crate::metrics::handlers::handle_metrics;
    use crate::metrics::registry::MetricsRegistry;
    use axum::Extension;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    // ============================================================
    // COUNTER TESTS
    // ============================================================

    #[test]
    fn test_counter_starts_at_zero() {
        let registry = MetricsRegistry::new("node-1");

        let counter = registry.counter("cache.puts");

        assert_eq!(counter.read(), 0);
        assert_eq!(counter.name(), "cache.puts");
    }

    #[test]
    fn test_counter_handles_share_state() {
        let registry = MetricsRegistry::new("node-1");

        let first = registry.counter("cache.puts");
        let second = registry.counter("cache.puts");

        first.increment(3);
        second.increment(2);

        assert_eq!(first.read(), 5);
        assert_eq!(registry.counter("cache.puts").read(), 5);
        assert_eq!(registry.metric_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_counter_no_lost_updates_under_contention() {
        let registry = MetricsRegistry::new("node-1");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                // Resolve by name on every call to exercise the map as well.
                for _ in 0..1000 {
                    registry.counter("cache.puts").increment(1);
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.counter("cache.puts").read(), 8000);
    }

    // ============================================================
    // GAUGE TESTS
    // ============================================================

    #[test]
    fn test_gauge_set_and_add() {
        let registry = MetricsRegistry::new("node-1");
        let gauge = registry.gauge("compute.jobs.active");

        gauge.set(10);
        assert_eq!(gauge.read(), 10);

        gauge.add(-3);
        assert_eq!(registry.gauge("compute.jobs.active").read(), 7);
    }

    // ============================================================
    // SNAPSHOT TESTS
    // ============================================================

    #[test]
    fn test_snapshot_contains_counters_and_gauges_sorted() {
        let registry = MetricsRegistry::new("node-1");

        registry.counter("z.counter").increment(4);
        registry.gauge("a.gauge").set(-2);
        registry.counter("m.counter");

        let snapshot = registry.snapshot();
        let names: Vec<&String> = snapshot.keys().collect();

        assert_eq!(names, vec!["a.gauge", "m.counter", "z.counter"]);
        assert_eq!(snapshot["z.counter"], 4);
        assert_eq!(snapshot["a.gauge"], -2);
        assert_eq!(snapshot["m.counter"], 0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let registry = MetricsRegistry::new("node-1");
        let counter = registry.counter("cache.gets");

        let before = registry.snapshot();
        counter.increment(1);

        assert_eq!(before["cache.gets"], 0);
        assert_eq!(registry.snapshot()["cache.gets"], 1);
    }

    #[tokio::test]
    async fn test_metrics_handler_reports_namespace() {
        let registry = MetricsRegistry::new("node-42");
        registry.counter("cache.puts").increment(7);

        let response = handle_metrics(Extension(registry)).await;

        assert_eq!(response.namespace, "node-42");
        assert_eq!(response.metrics["cache.puts"], 7);
    }

    // ============================================================
    // EXPORTER TESTS
    // ============================================================

    #[test]
    fn test_exporter_reports_every_metric() {
        let registry = MetricsRegistry::new("node-1");
        registry.counter("a").increment(1);
        registry.counter("b").increment(1);
        registry.gauge("c").set(1);

        let exporter = LogExporter::new(registry, Duration::from_millis(10));

        assert_eq!(exporter.export(), 3);
    }

    #[tokio::test]
    async fn test_exporter_stops_on_cancellation() {
        let registry = MetricsRegistry::new("node-1");
        let exporter = LogExporter::new(registry, Duration::from_millis(5));
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(exporter.run(shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("exporter did not stop")
            .unwrap();
    }
}
