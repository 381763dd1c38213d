//! Compute Broadcast Module
//!
//! Fans a task out to every live server node and collects one outcome per node.
//!
//! ## Execution Flow
//! 1. **Snapshot**: `TaskBroadcaster::broadcast` takes a membership snapshot and keeps only the
//!    live server nodes. Nodes joining afterwards are not part of this broadcast.
//! 2. **Dispatch**: One tokio task per target node hands the task to a `TaskDispatcher`
//!    (HTTP in production, in-process in tests). Executions are independent; one failing node
//!    never cancels the others.
//! 3. **Execution**: On the target node, `JobExecutor` resolves the task's handler in the
//!    `TaskHandlerRegistry`, runs it and records job metrics.
//! 4. **Collection**: `PendingBroadcast::await_all` waits for every execution or the deadline,
//!    whichever comes first. Executions still running at the deadline are reported as
//!    `TimedOut` and left to finish in the background.
//!
//! ## Submodules
//! - **`broadcaster`**: Fan-out and result collection.
//! - **`dispatcher`**: The transport seam (`TaskDispatcher`) and its implementations.
//! - **`executor`**: Node-side execution with job metrics.
//! - **`registry`**: Maps handler names (e.g. "scan_sum") to executable closures.
//! - **`jobs`**: Built-in handlers.
//! - **`protocol`**: HTTP DTOs for remote execution.

pub mod broadcaster;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod jobs;
pub mod protocol;
pub mod registry;
pub mod types;
