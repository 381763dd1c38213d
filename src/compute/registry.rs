//! Task Handler Registry
//!
//! Maps handler names (e.g. "scan_sum") to executable closures. Every server node registers
//! the same set of handlers at startup, so a broadcast task only needs to carry the name.

use super::types::*;

use anyhow::Result;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A handler receives the whole task and decodes its own payload.
pub type TaskHandlerFn =
    Arc<dyn Fn(Task) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

#[derive(Default)]
pub struct TaskHandlerRegistry {
    handlers: DashMap<String, TaskHandlerFn>,
}

impl TaskHandlerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `handler` under `handler_name`, replacing any previous registration.
    pub fn register<F, Fut>(&self, handler_name: &str, handler: F)
    where
        F: Fn(Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let boxed: TaskHandlerFn = Arc::new(move |task: Task| {
            Box::pin(handler(task)) as Pin<Box<dyn Future<Output = Result<()>> + Send>>
        });

        if self.handlers.insert(handler_name.to_string(), boxed).is_some() {
            tracing::warn!("Task handler '{}' replaced", handler_name);
        } else {
            tracing::debug!("Task handler '{}' registered", handler_name);
        }
    }

    /// Looks up the task's handler and runs it.
    ///
    /// Fails if the handler fails or if no handler is registered under the task's name.
    pub async fn execute(&self, task: &Task) -> Result<()> {
        // Clone the handle out so no shard lock is held across the await.
        let handler_fn = self
            .handlers
            .get(task.handler())
            .map(|entry| entry.value().clone());

        let Some(handler_fn) = handler_fn else {
            anyhow::bail!("No task handler registered under '{}'", task.handler());
        };

        handler_fn(task.clone()).await
    }

    /// Registered handler names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.iter().map(|h| h.key().clone()).collect();
        names.sort();
        names
    }

    pub fn contains(&self, handler_name: &str) -> bool {
        self.handlers.contains_key(handler_name)
    }
}
