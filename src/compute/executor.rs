//! Node-side task execution.
//!
//! Wraps the handler registry with the job metrics a server node exposes:
//! `compute.jobs.started`, `.finished`, `.failed`, `.execution_time_ms` and the
//! `compute.jobs.active` gauge.

use super::registry::TaskHandlerRegistry;
use super::types::*;
use crate::metrics::registry::{Counter, Gauge, MetricsRegistry};

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct JobMetrics {
    started: Counter,
    finished: Counter,
    failed: Counter,
    execution_time_ms: Counter,
    active: Gauge,
}

/// Decrements the active-jobs gauge even if the handler panics.
struct ActiveJob<'a>(&'a Gauge);

impl<'a> ActiveJob<'a> {
    fn enter(gauge: &'a Gauge) -> Self {
        gauge.add(1);
        Self(gauge)
    }
}

impl Drop for ActiveJob<'_> {
    fn drop(&mut self) {
        self.0.add(-1);
    }
}

pub struct JobExecutor {
    handlers: Arc<TaskHandlerRegistry>,
    metrics: JobMetrics,
}

impl JobExecutor {
    pub fn new(handlers: Arc<TaskHandlerRegistry>, registry: &MetricsRegistry) -> Arc<Self> {
        Arc::new(Self {
            handlers,
            metrics: JobMetrics {
                started: registry.counter("compute.jobs.started"),
                finished: registry.counter("compute.jobs.finished"),
                failed: registry.counter("compute.jobs.failed"),
                execution_time_ms: registry.counter("compute.jobs.execution_time_ms"),
                active: registry.gauge("compute.jobs.active"),
            },
        })
    }

    /// Runs one task to completion and returns how long it took.
    pub async fn execute(&self, task_id: &TaskId, task: &Task) -> Result<Duration> {
        self.metrics.started.increment(1);
        let _active = ActiveJob::enter(&self.metrics.active);
        let started_at = Instant::now();

        let result = self.handlers.execute(task).await;

        let elapsed = started_at.elapsed();
        self.metrics
            .execution_time_ms
            .increment(elapsed.as_millis() as u64);

        match result {
            Ok(()) => {
                self.metrics.finished.increment(1);
                tracing::debug!(
                    "Task {} ({}) finished in {:?}",
                    task_id,
                    task.handler(),
                    elapsed
                );
                Ok(elapsed)
            }
            Err(e) => {
                self.metrics.failed.increment(1);
                tracing::warn!("Task {} ({}) failed: {}", task_id, task.handler(), e);
                Err(e)
            }
        }
    }
}
