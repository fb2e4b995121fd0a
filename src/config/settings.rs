//! Engine settings
//!
//! # Main Types
//!
//! - [`DispatcherConfig`] - Worker pool sizing and queue policy
//! - [`QueuePolicy`] - What happens to pending work (unbounded / bounded)
//! - [`Supervision`] - What happens when a delivery fails
//! - [`LoggingConfig`] - Tracing filter and optional log file
//!
//! # Queue Policy
//!
//! The default is an unbounded queue with depth monitoring: a warning is
//! logged when in-flight work crosses `queue_warn_threshold`. A bounded queue
//! either blocks the sender or drops the newest delivery. Blocking applies to
//! callers outside the pool; a delivery on a worker drops instead of waiting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of workers started eagerly
pub const DEFAULT_MIN_WORKERS: usize = 4;

/// Default ceiling for pool growth
pub const DEFAULT_MAX_WORKERS: usize = 64;

/// Default in-flight count that triggers a queue-depth warning
pub const DEFAULT_QUEUE_WARN_THRESHOLD: usize = 10_000;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,pingraph=debug";

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Workers spawned when the pool is created
    pub min_workers: usize,

    /// Upper bound the pool may grow to when every worker is busy
    pub max_workers: usize,

    /// Pending-work policy
    pub queue: QueuePolicy,

    /// In-flight deliveries above which a warning is logged
    pub queue_warn_threshold: usize,

    /// Prefix for worker thread names
    pub thread_name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            min_workers: DEFAULT_MIN_WORKERS,
            max_workers: DEFAULT_MAX_WORKERS,
            queue: QueuePolicy::default(),
            queue_warn_threshold: DEFAULT_QUEUE_WARN_THRESHOLD,
            thread_name: "pingraph-worker".to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Fixed-size pool with no growth
    pub fn fixed(workers: usize) -> Self {
        Self {
            min_workers: workers,
            max_workers: workers,
            ..Self::default()
        }
    }
}

/// How pending deliveries are queued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Unlimited queue; growth is only reported
    #[default]
    Unbounded,
    /// Fixed-capacity queue
    Bounded {
        capacity: usize,
        #[serde(default)]
        overflow: Overflow,
    },
}

/// Behavior when a bounded queue is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    /// A sender outside the pool waits for room. Worker threads drop
    #[default]
    Block,
    /// The new delivery is discarded and counted
    DropNewest,
}

/// Supervision policy applied to failed deliveries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Supervision {
    /// Log the failure and drop that unit of work; the rest of the graph
    /// keeps running
    #[default]
    LogAndDrop,
    /// Log the failure and stop accepting work, winding the graph down
    HaltDispatcher,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,

    /// Optional log file; written through a non-blocking appender
    pub file: Option<PathBuf>,

    /// Include thread names in console output
    pub thread_names: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            file: None,
            thread_names: true,
        }
    }
}
