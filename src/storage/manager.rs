use super::store::KeyValueStore;
use crate::metrics::registry::MetricsRegistry;

use dashmap::DashMap;
use std::sync::Arc;

/// All caches hosted by one server node, created on first use.
pub struct CacheManager {
    caches: DashMap<String, Arc<KeyValueStore>>,
    metrics: Arc<MetricsRegistry>,
}

impl CacheManager {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Arc<Self> {
        Arc::new(Self {
            caches: DashMap::new(),
            metrics,
        })
    }

    pub fn get_or_create(&self, name: &str) -> Arc<KeyValueStore> {
        if let Some(cache) = self.caches.get(name) {
            return cache.clone();
        }

        self.caches
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::info!("Created cache {}", name);
                Arc::new(KeyValueStore::new(name, &self.metrics))
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<KeyValueStore>> {
        self.caches.get(name).map(|cache| cache.clone())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn refresh_gauges(&self) {
        for cache in self.caches.iter() {
            cache.value().refresh_gauges();
        }
    }
}
