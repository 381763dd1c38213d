//! Load Generation Module
//!
//! The two background drivers run by a client node:
//! - **`updater`**: Bursts of random puts and gets against a cache, separated by a park time.
//! - **`sender`**: Rounds of concurrent `scan_sum` broadcasts; a round must finish before the
//!   next one starts, which bounds the compute load a single client can create.
//!
//! Both loops stop when their `CancellationToken` is cancelled.

pub mod sender;
pub mod updater;
