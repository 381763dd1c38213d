//! Storage Module Tests
//!
//! Validates the cache semantics and the local routing logic.
//!
//! ## Test Scopes
//! - **KeyValueStore**: Last-write-wins, hit/miss accounting, counter atomicity, scan contents.
//! - **CacheManager**: Get-or-create semantics and gauge refresh.
//! - **Partitioner**: Deterministic hashing and stable owner selection.
//! - **Handlers**: HTTP status mapping for hits and misses.
//!
//! *Note: `RemoteCache` talks HTTP and is covered by the integration tests.*

#[cfg(test)]
mod tests {
    use crate::membership::types::{Node, NodeId};
    use crate::metrics::registry::MetricsRegistry;
    use crate::storage::cache::Cache;
    use crate::storage::handlers::{handle_get, handle_put, handle_size};
    use crate::storage::manager::CacheManager;
    use crate::storage::partitioner::PartitionManager;
    use crate::storage::protocol::PutRequest;
    use crate::storage::store::KeyValueStore;
    use axum::extract::{Extension, Json, Path};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;

    fn store() -> (Arc<MetricsRegistry>, KeyValueStore) {
        let registry = MetricsRegistry::new("node-1");
        let store = KeyValueStore::new("RecordsCache", &registry);
        (registry, store)
    }

    // ============================================================
    // KEY-VALUE STORE TESTS
    // ============================================================

    #[test]
    fn test_last_write_wins() {
        let (_, store) = store();

        for value in [3, 1, 4, 1, 5, 9] {
            store.put(7, value);
        }

        assert_eq!(store.get(7), Some(9));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_key_counts_miss() {
        let (registry, store) = store();

        assert_eq!(store.get(404), None);

        assert_eq!(registry.counter("cache.RecordsCache.gets").read(), 1);
        assert_eq!(registry.counter("cache.RecordsCache.misses").read(), 1);
        assert_eq!(registry.counter("cache.RecordsCache.hits").read(), 0);
    }

    #[test]
    fn test_get_existing_key_counts_hit() {
        let (registry, store) = store();
        store.put(1, 100);

        assert_eq!(store.get(1), Some(100));

        assert_eq!(registry.counter("cache.RecordsCache.hits").read(), 1);
        assert_eq!(registry.counter("cache.RecordsCache.misses").read(), 0);
    }

    #[test]
    fn test_put_updates_entry_metadata() {
        let (_, store) = store();

        store.put(1, 10);
        let first = store.entry(1).unwrap();
        store.put(2, 20);
        store.put(1, 11);
        let updated = store.entry(1).unwrap();

        assert_eq!(updated.value, 11);
        assert_eq!(updated.created_seq, first.created_seq, "Overwrite keeps creation order");
        assert!(updated.modified_at >= first.modified_at);
        assert_eq!(store.entry(2).unwrap().created_seq, first.created_seq + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_puts_counter_exact_under_concurrency() {
        let registry = MetricsRegistry::new("node-1");
        let store = Arc::new(KeyValueStore::new("RecordsCache", &registry));

        let mut handles = Vec::new();
        for worker in 0..8i64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..500i64 {
                    // Overlapping keys across workers to contend on the same shards.
                    store.put(i % 50, worker * 1000 + i);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.counter("cache.RecordsCache.puts").read(), 4000);
        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_scan_sum() {
        let (registry, store) = store();
        store.put(1, 10);
        store.put(2, 20);
        store.put(3, 30);

        assert_eq!(store.scan_sum(), 60);
        assert_eq!(registry.counter("cache.RecordsCache.scans").read(), 1);
    }

    #[test]
    fn test_scan_sum_empty_store() {
        let (_, store) = store();

        assert_eq!(store.scan_sum(), 0);
    }

    #[test]
    fn test_scan_sum_wraps_on_overflow() {
        let (registry, store) = store();
        store.put(1, i64::MAX);
        store.put(2, 1);

        assert_eq!(store.scan_sum(), i64::MIN);
        assert_eq!(registry.counter("cache.RecordsCache.scans").read(), 1);
    }

    #[test]
    fn test_scan_excludes_keys_created_after_it_started() {
        let (_, store) = store();
        for key in 0..1000 {
            store.put(key, 1);
        }
        let watermark = store.watermark();

        for key in 1000..2000 {
            store.put(key, 1_000_000);
        }
        // Overwrites keep their original creation sequence.
        store.put(0, 2);

        assert_eq!(store.scan_sum_at(watermark), 1001);
        assert_eq!(store.len(), 2000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_scan_counts_existing_keys_exactly_once() {
        let registry = MetricsRegistry::new("node-1");
        let store = Arc::new(KeyValueStore::new("RecordsCache", &registry));

        // ARRANGE: 1000 keys worth 1 each exist before the scan starts.
        for key in 0..1000 {
            store.put(key, 1);
        }
        let watermark = store.watermark();

        // A writer keeps inserting brand-new keys worth 1_000_000 each.
        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for key in 1000..201_000 {
                    store.put(key, 1_000_000);
                }
            })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        // ACT: scan while the writer is running.
        let sum = store.scan_sum_at(watermark);
        writer.await.unwrap();

        // ASSERT: every old key counted once, no new key counted.
        assert_eq!(sum, 1000);
        assert_eq!(store.len(), 201_000);
    }

    #[tokio::test]
    async fn test_store_through_cache_trait() {
        let (_, store) = store();
        let cache: &dyn Cache = &store;

        cache.put(5, 50).await.unwrap();

        assert_eq!(cache.name(), "RecordsCache");
        assert_eq!(cache.get(5).await.unwrap(), Some(50));
        assert_eq!(cache.get(6).await.unwrap(), None);
    }

    // ============================================================
    // CACHE MANAGER TESTS
    // ============================================================

    #[test]
    fn test_get_or_create_returns_same_cache() {
        let manager = CacheManager::new(MetricsRegistry::new("node-1"));

        let first = manager.get_or_create("RecordsCache");
        first.put(1, 1);
        let second = manager.get_or_create("RecordsCache");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.get(1), Some(1));
        assert!(manager.get("Other").is_none());
        assert_eq!(manager.names(), vec!["RecordsCache".to_string()]);
    }

    #[test]
    fn test_refresh_gauges_reports_size() {
        let registry = MetricsRegistry::new("node-1");
        let manager = CacheManager::new(registry.clone());
        let cache = manager.get_or_create("RecordsCache");
        cache.put(1, 1);
        cache.put(2, 2);

        manager.refresh_gauges();

        assert_eq!(registry.gauge("cache.RecordsCache.size").read(), 2);
    }

    // ============================================================
    // PARTITIONER TESTS
    // ============================================================

    #[test]
    fn test_partition_is_deterministic_and_in_range() {
        let partitioner = PartitionManager::new();

        for key in 0..1000 {
            let p1 = partitioner.get_partition(key);
            let p2 = partitioner.get_partition(key);
            assert_eq!(p1, p2, "The same key should yield the same partition");
            assert!(p1 < partitioner.num_partitions);
        }
    }

    #[test]
    fn test_owner_selection_ignores_member_order_and_clients() {
        let partitioner = PartitionManager::new();
        let a = Node::server(NodeId("a".into()), "127.0.0.1:5000".parse().unwrap());
        let b = Node::server(NodeId("b".into()), "127.0.0.1:5001".parse().unwrap());
        let c = Node::client(NodeId("c".into()));

        let forward = vec![a.clone(), b.clone(), c.clone()];
        let backward = vec![c, b, a];

        for key in 0..200 {
            let left = partitioner.owner_of(key, &forward).unwrap();
            let right = partitioner.owner_of(key, &backward).unwrap();
            assert_eq!(left.id, right.id);
            assert!(left.is_server());
        }
    }

    #[test]
    fn test_no_owner_without_servers() {
        let partitioner = PartitionManager::new();
        let clients = vec![Node::client(NodeId("c".into()))];

        assert!(partitioner.owner_of(1, &clients).is_none());
        assert!(partitioner.owner_of(1, &[]).is_none());
    }

    // ============================================================
    // HANDLER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_put_then_get_handlers() {
        let manager = CacheManager::new(MetricsRegistry::new("node-1"));

        let (status, body) = handle_put(
            Extension(manager.clone()),
            Path("RecordsCache".to_string()),
            Json(PutRequest { key: 3, value: 33 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);

        let (status, body) = handle_get(
            Extension(manager.clone()),
            Path(("RecordsCache".to_string(), 3)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.value, Some(33));

        let size = handle_size(Extension(manager), Path("RecordsCache".to_string())).await;
        assert_eq!(size.entries, 1);
    }

    #[tokio::test]
    async fn test_get_handler_miss_is_not_found() {
        let manager = CacheManager::new(MetricsRegistry::new("node-1"));

        let (status, body) =
            handle_get(Extension(manager), Path(("RecordsCache".to_string(), 99))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.value, None);
    }
}
