//! Worker substrates that execute deliveries.
//!
//! Every edge traversal becomes one [`Job`] handed to a [`Dispatcher`]. The
//! dispatcher is injected into the [`Graph`](crate::graph::Graph) when it is
//! built, so tests can swap the thread pool for a deterministic stepper.
//!
//! ```text
//! OutputPin::send ──► Dispatcher::dispatch(job) ──► worker ──► Filter::receive
//!                                                              └──► OutputPin::send ...
//! ```
//!
//! - [`WorkerPool`]: crossbeam-channel backed pool that grows on demand.
//! - [`StepDispatcher`]: single-threaded FIFO, runs only when stepped.
//! - [`BlockingDispatcher`]: tokio blocking pool, for async hosts.
//!
//! A cycle never grows the call stack: each hop returns to the worker loop
//! before the next one runs.

pub mod blocking;
pub mod pool;
pub mod step;

pub use blocking::BlockingDispatcher;
pub use pool::{PoolStats, WorkerPool};
pub use step::StepDispatcher;

use crate::config::Supervision;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// One scheduled delivery.
pub type Job = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Executes jobs without blocking the caller on their completion.
#[cfg_attr(test, mockall::automock)]
pub trait Dispatcher: Send + Sync {
    /// Schedule `job`. Must not run it to completion on the caller's stack.
    fn dispatch(&self, job: Job);
}

/// Applies a [`Supervision`] policy to job outcomes.
#[derive(Debug)]
pub struct Supervisor {
    policy: Supervision,
    halted: AtomicBool,
    failures: AtomicU64,
}

impl Supervisor {
    pub fn new(policy: Supervision) -> Self {
        Self {
            policy,
            halted: AtomicBool::new(false),
            failures: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> Supervision {
        self.policy
    }

    /// Run a job, catching both errors and panics. Returns `true` on success.
    pub fn run(&self, job: Job) -> bool {
        match catch_unwind(AssertUnwindSafe(job)) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                self.fail(&format!("{:#}", e));
                false
            }
            Err(panic) => {
                self.fail(&format!("panicked: {}", panic_message(&*panic)));
                false
            }
        }
    }

    fn fail(&self, reason: &str) {
        let total = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        match self.policy {
            Supervision::LogAndDrop => {
                tracing::warn!("Delivery failed, branch dropped ({} total): {}", total, reason);
            }
            Supervision::HaltDispatcher => {
                tracing::error!("Delivery failed, halting dispatcher: {}", reason);
                self.halt();
            }
        }
    }

    /// Stop accepting work.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::Release);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
