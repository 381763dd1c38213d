use crate::membership::types::now_ms;
use crate::metrics::registry::{Counter, Gauge, MetricsRegistry};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A stored value plus its bookkeeping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub value: i64,
    /// Position of the key's first insertion in the store's creation order (starts at 1).
    pub created_seq: u64,
    /// Timestamp (ms) of the last put.
    pub modified_at: u64,
}

struct CacheMetrics {
    puts: Counter,
    gets: Counter,
    hits: Counter,
    misses: Counter,
    scans: Counter,
    size: Gauge,
}

impl CacheMetrics {
    fn new(cache_name: &str, registry: &MetricsRegistry) -> Self {
        let metric = |suffix: &str| format!("cache.{}.{}", cache_name, suffix);

        Self {
            puts: registry.counter(&metric("puts")),
            gets: registry.counter(&metric("gets")),
            hits: registry.counter(&metric("hits")),
            misses: registry.counter(&metric("misses")),
            scans: registry.counter(&metric("scans")),
            size: registry.gauge(&metric("size")),
        }
    }
}

/// A named in-memory cache.
pub struct KeyValueStore {
    name: String,
    entries: DashMap<i64, CacheEntry>,
    /// Last creation sequence number handed out.
    created: AtomicU64,
    metrics: CacheMetrics,
}

impl KeyValueStore {
    pub fn new(name: &str, registry: &MetricsRegistry) -> Self {
        Self {
            name: name.to_string(),
            entries: DashMap::new(),
            created: AtomicU64::new(0),
            metrics: CacheMetrics::new(name, registry),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates or overwrites the entry for `key`. Last write wins.
    pub fn put(&self, key: i64, value: i64) {
        let modified_at = now_ms();

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.value = value;
                entry.modified_at = modified_at;
            }
            Entry::Vacant(vacant) => {
                // Taken while the shard is write-locked, so a scan that reads the watermark
                // afterwards is guaranteed to find the entry in its shard.
                let created_seq = self.created.fetch_add(1, Ordering::SeqCst) + 1;
                vacant.insert(CacheEntry {
                    value,
                    created_seq,
                    modified_at,
                });
            }
        }

        self.metrics.puts.increment(1);
    }

    /// Returns the value for `key`, or `None` if it was never written.
    pub fn get(&self, key: i64) -> Option<i64> {
        self.metrics.gets.increment(1);

        match self.entries.get(&key) {
            Some(entry) => {
                self.metrics.hits.increment(1);
                Some(entry.value().value)
            }
            None => {
                self.metrics.misses.increment(1);
                None
            }
        }
    }

    /// Full entry lookup. Not counted as a cache read.
    pub fn entry(&self, key: i64) -> Option<CacheEntry> {
        self.entries.get(&key).map(|entry| *entry)
    }

    /// Sums the values of every key present when the scan starts.
    ///
    /// Keys inserted after the scan started are skipped; each included key is counted once.
    /// A key overwritten while the scan runs contributes either its old or its new value.
    /// Only one shard is read-locked at a time, so writers to other shards are never blocked.
    ///
    /// The sum wraps on overflow (two's complement), so any stored values can be scanned.
    pub fn scan_sum(&self) -> i64 {
        self.scan_sum_at(self.watermark())
    }

    /// Creation sequence of the newest key. Every key with a lower or equal sequence is stored.
    pub(crate) fn watermark(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    /// Sums the keys created at or before `watermark`.
    pub(crate) fn scan_sum_at(&self, watermark: u64) -> i64 {
        self.metrics.scans.increment(1);

        self.entries
            .iter()
            .filter(|entry| entry.value().created_seq <= watermark)
            .fold(0i64, |sum, entry| sum.wrapping_add(entry.value().value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn refresh_gauges(&self) {
        self.metrics.size.set(self.entries.len() as i64);
    }
}
