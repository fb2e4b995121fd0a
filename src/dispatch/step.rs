//! Deterministic dispatcher for tests.
//!
//! Jobs are queued in FIFO order and only run when the caller steps the
//! queue, on the caller's thread. A self-sustaining cycle therefore runs for
//! exactly as many hops as the test asks for.

use crate::config::Supervision;
use crate::dispatch::{Dispatcher, Job, Supervisor};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

pub struct StepDispatcher {
    queue: Mutex<VecDeque<Job>>,
    supervisor: Supervisor,
}

impl StepDispatcher {
    pub fn new() -> Self {
        Self::with_supervision(Supervision::LogAndDrop)
    }

    pub fn with_supervision(policy: Supervision) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            supervisor: Supervisor::new(policy),
        }
    }

    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Run the oldest queued job. Returns `None` when the queue is empty,
    /// otherwise whether the job succeeded.
    pub fn step(&self) -> Option<bool> {
        // The lock must be released before running: the job may dispatch.
        let job = self.lock().pop_front()?;
        Some(self.supervisor.run(job))
    }

    /// Run up to `max` jobs; returns how many ran.
    pub fn run_steps(&self, max: usize) -> usize {
        let mut ran = 0;
        while ran < max && self.step().is_some() {
            ran += 1;
        }
        ran
    }

    /// Run until the queue is empty; returns how many jobs ran.
    ///
    /// Never returns for an unthrottled cycle. Use [`run_steps`](Self::run_steps).
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.step().is_some() {
            ran += 1;
        }
        ran
    }

    pub fn failures(&self) -> u64 {
        self.supervisor.failures()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Job>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StepDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for StepDispatcher {
    fn dispatch(&self, job: Job) {
        if self.supervisor.is_halted() {
            tracing::debug!("StepDispatcher halted, delivery dropped");
            return;
        }
        self.lock().push_back(job);
    }
}
