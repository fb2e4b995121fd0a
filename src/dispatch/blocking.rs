//! Dispatcher backed by a tokio runtime's blocking pool.
//!
//! Deliveries may block on I/O, so they go to `spawn_blocking` rather than
//! the async worker threads. The runtime's `max_blocking_threads` bounds
//! growth.

use crate::config::Supervision;
use crate::dispatch::{Dispatcher, Job, Supervisor};
use crate::error::{GraphError, Result};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct BlockingDispatcher {
    handle: Handle,
    supervisor: Arc<Supervisor>,
}

impl BlockingDispatcher {
    pub fn new(handle: Handle, policy: Supervision) -> Self {
        Self {
            handle,
            supervisor: Arc::new(Supervisor::new(policy)),
        }
    }

    /// Bind to the runtime the caller is running inside.
    pub fn current(policy: Supervision) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| GraphError::Dispatch(format!("no tokio runtime: {}", e)))?;
        Ok(Self::new(handle, policy))
    }

    pub fn failures(&self) -> u64 {
        self.supervisor.failures()
    }
}

impl Dispatcher for BlockingDispatcher {
    fn dispatch(&self, job: Job) {
        if self.supervisor.is_halted() {
            tracing::debug!("BlockingDispatcher halted, delivery dropped");
            return;
        }
        let supervisor = Arc::clone(&self.supervisor);
        // Detached: completion is observed through the graph, not the handle.
        drop(self.handle.spawn_blocking(move || {
            supervisor.run(job);
        }));
    }
}
