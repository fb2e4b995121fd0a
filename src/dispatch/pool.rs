//! Thread pool dispatcher.
//!
//! Workers pull jobs from a shared crossbeam channel. `min_workers` threads
//! start immediately; when a job is enqueued while every worker already has
//! one, the pool spawns another, up to `max_workers`. A delivery that blocks
//! on slow I/O therefore does not starve unrelated ones until the ceiling is
//! reached.
//!
//! # Lifecycle
//!
//! The pool runs until [`WorkerPool::shutdown`] is called. Shutdown stops
//! intake, lets queued work drain and joins the workers. Dispatches after
//! shutdown (including those made by draining deliveries) are dropped, and
//! anything left in the queue once the last worker has exited is reclaimed
//! and counted as dropped.
//!
//! # Bounded queues
//!
//! With [`Overflow::Block`] a caller outside the pool waits for room. A
//! delivery running on a worker never waits: it tries to grow the pool and,
//! if the queue is still full, drops the new job. A full queue whose only
//! consumers are blocked senders would otherwise never drain.

use crate::config::{DispatcherConfig, Overflow, QueuePolicy, Supervision};
use crate::dispatch::{Dispatcher, Job, Supervisor};
use crate::error::{GraphError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use serde::Serialize;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

thread_local! {
    static ON_WORKER: Cell<bool> = const { Cell::new(false) };
}

enum Message {
    Run(Job),
    Stop,
}

/// Point-in-time counters for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Live worker threads
    pub workers: usize,
    /// Workers waiting for a job
    pub idle: usize,
    /// Deliveries queued or running
    pub in_flight: usize,
    /// Deliveries that ran to completion
    pub completed: u64,
    /// Deliveries that returned an error or panicked
    pub failed: u64,
    /// Deliveries discarded (queue full, halted or shut down)
    pub dropped: u64,
}

struct Shared {
    config: DispatcherConfig,
    supervisor: Supervisor,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    accepting: AtomicBool,
    workers: AtomicUsize,
    idle: AtomicUsize,
    in_flight: AtomicUsize,
    completed: AtomicU64,
    dropped: AtomicU64,
    depth_warned: AtomicBool,
    spawned: AtomicUsize,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Growable worker pool.
#[derive(Clone)]
pub struct WorkerPool {
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Create a pool and start `min_workers` threads.
    pub fn new(config: DispatcherConfig, supervision: Supervision) -> Result<Self> {
        if config.min_workers == 0 || config.max_workers < config.min_workers {
            return Err(GraphError::Config(format!(
                "invalid worker bounds: min={} max={}",
                config.min_workers, config.max_workers
            )));
        }

        let (tx, rx) = match config.queue {
            QueuePolicy::Unbounded => unbounded(),
            QueuePolicy::Bounded { capacity, .. } => bounded(capacity),
        };

        let pool = Self {
            shared: Arc::new(Shared {
                supervisor: Supervisor::new(supervision),
                tx,
                rx,
                accepting: AtomicBool::new(true),
                workers: AtomicUsize::new(0),
                idle: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                depth_warned: AtomicBool::new(false),
                spawned: AtomicUsize::new(0),
                handles: Mutex::new(Vec::new()),
                config,
            }),
        };

        for _ in 0..pool.shared.config.min_workers {
            if !pool.try_grow() {
                break;
            }
        }
        if pool.shared.workers.load(Ordering::Acquire) == 0 {
            return Err(GraphError::Dispatch("no worker thread could be spawned".to_string()));
        }

        tracing::info!(
            "Worker pool started: {} workers (max {}), queue {:?}",
            pool.shared.config.min_workers,
            pool.shared.config.max_workers,
            pool.shared.config.queue
        );
        Ok(pool)
    }

    /// Pool with default settings.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DispatcherConfig::default(), Supervision::default())
    }

    pub fn stats(&self) -> PoolStats {
        let s = &self.shared;
        PoolStats {
            workers: s.workers.load(Ordering::Acquire),
            idle: s.idle.load(Ordering::Acquire),
            in_flight: s.in_flight.load(Ordering::Acquire),
            completed: s.completed.load(Ordering::Relaxed),
            failed: s.supervisor.failures(),
            dropped: s.dropped.load(Ordering::Relaxed),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::Acquire) && !self.shared.supervisor.is_halted()
    }

    /// Block until nothing is queued or running, or `timeout` elapses.
    /// Returns whether the pool went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.shared.in_flight.load(Ordering::Acquire) == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stop intake, drain queued work and join all workers.
    ///
    /// Called from inside a delivery, it only stops intake; the workers exit
    /// on their own once the queue drains.
    pub fn shutdown(&self) {
        if !self.shared.accepting.swap(false, Ordering::AcqRel) {
            return;
        }
        tracing::info!("Worker pool shutting down");

        // try_grow checks `accepting` under this lock, so no worker can be
        // spawned after the count is read.
        let (workers, handles) = {
            let mut handles = self
                .shared
                .handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let workers = self.shared.spawned.load(Ordering::Acquire);
            let handles: Vec<_> = if ON_WORKER.with(Cell::get) {
                Vec::new()
            } else {
                handles.drain(..).collect()
            };
            (workers, handles)
        };

        for _ in 0..workers {
            if self.shared.tx.send(Message::Stop).is_err() {
                break;
            }
        }

        if ON_WORKER.with(Cell::get) {
            return;
        }

        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("Worker thread exited abnormally");
            }
        }
        self.reclaim_orphans();

        let stats = self.stats();
        tracing::info!(
            "Worker pool stopped: {} completed, {} failed, {} dropped",
            stats.completed,
            stats.failed,
            stats.dropped
        );
    }

    /// Spawn one worker if below the ceiling.
    fn try_grow(&self) -> bool {
        let s = &self.shared;
        let reserved = s
            .workers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < s.config.max_workers).then_some(n + 1)
            })
            .is_ok();
        if !reserved {
            return false;
        }

        let mut handles = s.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if !s.accepting.load(Ordering::Acquire) {
            s.workers.fetch_sub(1, Ordering::AcqRel);
            return false;
        }

        let index = s.spawned.fetch_add(1, Ordering::AcqRel);
        let shared = Arc::clone(&self.shared);
        let spawn = std::thread::Builder::new()
            .name(format!("{}-{}", s.config.thread_name, index))
            .spawn(move || worker_loop(shared));

        match spawn {
            Ok(handle) => {
                handles.push(handle);
                if index >= s.config.min_workers {
                    tracing::debug!("Worker pool grew to {} workers", index + 1);
                }
                true
            }
            Err(e) => {
                s.workers.fetch_sub(1, Ordering::AcqRel);
                s.spawned.fetch_sub(1, Ordering::AcqRel);
                tracing::error!("Failed to spawn worker thread: {}", e);
                false
            }
        }
    }

    fn drop_job(&self, why: &str) {
        let total = self.shared.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!("Delivery dropped ({}), {} dropped so far", why, total);
    }

    /// Drop jobs no worker is left to run. Only acts once every worker has
    /// exited after shutdown.
    fn reclaim_orphans(&self) {
        let s = &self.shared;
        if s.accepting.load(Ordering::Acquire) || s.workers.load(Ordering::Acquire) != 0 {
            return;
        }
        let mut reclaimed = 0usize;
        while let Ok(message) = s.rx.try_recv() {
            if let Message::Run(job) = message {
                drop(job);
                s.in_flight.fetch_sub(1, Ordering::AcqRel);
                self.drop_job("enqueued after shutdown");
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            tracing::debug!("Reclaimed {} deliveries left in the queue", reclaimed);
        }
    }

    /// Enqueue on a bounded blocking queue from a worker thread: grow once if
    /// full, then give up rather than wait on a queue only workers drain.
    fn send_from_worker(&self, job: Job) -> std::result::Result<(), &'static str> {
        let s = &self.shared;
        match s.tx.try_send(Message::Run(job)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err("queue disconnected"),
            Err(TrySendError::Full(message)) => {
                self.try_grow();
                match s.tx.try_send(message) {
                    Ok(()) => Ok(()),
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            "Bounded queue full while dispatching from a worker; delivery dropped"
                        );
                        Err("queue full on worker thread")
                    }
                    Err(TrySendError::Disconnected(_)) => Err("queue disconnected"),
                }
            }
        }
    }

    fn note_depth(&self, in_flight: usize) {
        let s = &self.shared;
        let threshold = s.config.queue_warn_threshold;
        if threshold == 0 {
            return;
        }
        if in_flight >= threshold {
            if !s.depth_warned.swap(true, Ordering::AcqRel) {
                tracing::warn!(
                    "Pending deliveries reached {} (threshold {}); a cycle may lack a delay",
                    in_flight,
                    threshold
                );
            }
        } else if in_flight < threshold / 2 {
            s.depth_warned.store(false, Ordering::Release);
        }
    }
}

impl Dispatcher for WorkerPool {
    fn dispatch(&self, job: Job) {
        if !self.is_accepting() {
            self.drop_job("dispatcher not accepting");
            return;
        }

        let s = &self.shared;
        let in_flight = s.in_flight.fetch_add(1, Ordering::AcqRel) + 1;

        let sent = match s.config.queue {
            QueuePolicy::Bounded {
                overflow: Overflow::DropNewest,
                ..
            } => match s.tx.try_send(Message::Run(job)) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    s.in_flight.fetch_sub(1, Ordering::AcqRel);
                    self.drop_job("queue full");
                    return;
                }
                Err(TrySendError::Disconnected(_)) => Err("queue disconnected"),
            },
            QueuePolicy::Bounded {
                overflow: Overflow::Block,
                ..
            } if ON_WORKER.with(Cell::get) => self.send_from_worker(job),
            _ => s
                .tx
                .send(Message::Run(job))
                .map_err(|_| "queue disconnected"),
        };

        if let Err(why) = sent {
            s.in_flight.fetch_sub(1, Ordering::AcqRel);
            self.drop_job(why);
            return;
        }

        // Shutdown may have joined the last worker while this send was
        // pending.
        if !s.accepting.load(Ordering::Acquire) {
            self.reclaim_orphans();
            return;
        }

        self.note_depth(in_flight);

        // More deliveries than workers means at least one is waiting.
        if in_flight > s.workers.load(Ordering::Acquire) {
            self.try_grow();
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    ON_WORKER.with(|w| w.set(true));
    shared.idle.fetch_add(1, Ordering::AcqRel);

    while let Ok(message) = shared.rx.recv() {
        match message {
            Message::Stop => break,
            Message::Run(job) => {
                shared.idle.fetch_sub(1, Ordering::AcqRel);
                if shared.supervisor.run(job) {
                    shared.completed.fetch_add(1, Ordering::Relaxed);
                }
                shared.in_flight.fetch_sub(1, Ordering::AcqRel);
                shared.idle.fetch_add(1, Ordering::AcqRel);
            }
        }
    }

    shared.idle.fetch_sub(1, Ordering::AcqRel);
    shared.workers.fetch_sub(1, Ordering::AcqRel);
}
