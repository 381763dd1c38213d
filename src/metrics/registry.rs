//! Metrics Registry
//!
//! Maps metric names to shared atomic cells. Handles returned by [`MetricsRegistry::counter`]
//! and [`MetricsRegistry::gauge`] are cheap clones of the same cell, so hot paths can resolve a
//! metric once and keep the handle around.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// A monotonically non-decreasing counter.
#[derive(Debug, Clone)]
pub struct Counter {
    name: Arc<str>,
    value: Arc<AtomicU64>,
}

impl Counter {
    fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            value: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Atomically adds `n` to the counter.
    pub fn increment(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn read(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A point-in-time value that may go up or down.
#[derive(Debug, Clone)]
pub struct Gauge {
    name: Arc<str>,
    value: Arc<AtomicI64>,
}

impl Gauge {
    fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            value: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Atomically adjusts the gauge by `delta` (used for "currently active" style gauges).
    pub fn add(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn read(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Registry of all counters and gauges of one node.
///
/// The `namespace` is the owning node's id; exporters prefix their output with it so metrics
/// of several nodes can be told apart in a shared log.
pub struct MetricsRegistry {
    namespace: String,
    counters: DashMap<String, Counter>,
    gauges: DashMap<String, Gauge>,
}

impl MetricsRegistry {
    pub fn new(namespace: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            namespace: namespace.into(),
            counters: DashMap::new(),
            gauges: DashMap::new(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the counter registered under `name`, creating it on first use.
    pub fn counter(&self, name: &str) -> Counter {
        if let Some(counter) = self.counters.get(name) {
            return counter.clone();
        }

        self.counters
            .entry(name.to_string())
            .or_insert_with(|| Counter::new(name))
            .clone()
    }

    /// Returns the gauge registered under `name`, creating it on first use.
    pub fn gauge(&self, name: &str) -> Gauge {
        if let Some(gauge) = self.gauges.get(name) {
            return gauge.clone();
        }

        self.gauges
            .entry(name.to_string())
            .or_insert_with(|| Gauge::new(name))
            .clone()
    }

    /// Reads every metric once. A counter and a gauge sharing a name collapse to the gauge.
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        let mut snapshot = BTreeMap::new();

        for entry in self.counters.iter() {
            let value = i64::try_from(entry.value().read()).unwrap_or(i64::MAX);
            snapshot.insert(entry.key().clone(), value);
        }

        for entry in self.gauges.iter() {
            snapshot.insert(entry.key().clone(), entry.value().read());
        }

        snapshot
    }

    pub fn metric_count(&self) -> usize {
        self.counters.len() + self.gauges.len()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self {
            namespace: String::from("local"),
            counters: DashMap::new(),
            gauges: DashMap::new(),
        }
    }
}
