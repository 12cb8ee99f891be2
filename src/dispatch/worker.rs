//! Thread-pool dispatcher fed by a crossbeam channel.

use super::{Dispatcher, Work};
use crate::error::{panic_message, HolderError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, error, trace};

/// Configuration for a [`WorkerDispatcher`].
#[derive(Clone, Debug)]
pub struct WorkerDispatcherConfig {
    /// Number of worker threads. Must be at least 1.
    /// Default: 1 (work runs in submission order)
    pub workers: usize,

    /// Max queued units of work. Outside callers block while the queue is
    /// full; the dispatcher's own workers run the work inline instead.
    /// Default: None (unbounded)
    pub queue_capacity: Option<usize>,

    /// Prefix for worker thread names; each thread gets `{prefix}-{index}`.
    /// Default: "resource-holder"
    pub thread_name: String,
}

impl Default for WorkerDispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: None,
            thread_name: "resource-holder".to_string(),
        }
    }
}

/// Runs units of work on a fixed pool of worker threads.
///
/// With more than one worker, units of work may run concurrently and in any
/// order. Dropping the dispatcher (or calling [`shutdown`](Self::shutdown))
/// lets the workers finish everything already queued, then joins them.
///
/// Work dispatched from a worker thread never blocks on a full queue: it runs
/// inline on that worker, ahead of anything still queued. A unit of work that
/// panics is logged and the worker keeps running.
pub struct WorkerDispatcher {
    /// Queue handle. `None` once shut down.
    sender: Mutex<Option<Sender<Work>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Ids of the spawned workers, kept after shutdown takes the handles.
    worker_ids: Vec<ThreadId>,
}

impl WorkerDispatcher {
    /// Spawn the worker threads.
    pub fn new(config: WorkerDispatcherConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(HolderError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if config.queue_capacity == Some(0) {
            return Err(HolderError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        let (sender, receiver) = match config.queue_capacity {
            Some(capacity) => bounded(capacity),
            None => unbounded(),
        };

        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name, index))
                .spawn(move || run_worker(receiver))?;
            workers.push(handle);
        }

        let worker_ids = workers.iter().map(|h| h.thread().id()).collect();

        debug!(
            workers = config.workers,
            queue_capacity = ?config.queue_capacity,
            "Started worker dispatcher"
        );

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            worker_ids,
        })
    }

    /// Queue a unit of work, reporting failure instead of logging it.
    pub fn try_dispatch(&self, work: Work) -> Result<()> {
        // Clone out so a blocking send on a full queue doesn't hold the lock.
        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or(HolderError::DispatcherClosed)?;

        if !self.is_worker_thread() {
            return sender.send(work).map_err(|_| HolderError::DispatcherClosed);
        }

        // Blocking here could wait on the only thread able to drain the queue.
        match sender.try_send(work) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(work)) => {
                trace!("Queue full, running work inline on worker");
                run_guarded(work);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(HolderError::DispatcherClosed),
        }
    }

    /// Whether the calling thread is one of this dispatcher's workers.
    fn is_worker_thread(&self) -> bool {
        self.worker_ids.contains(&thread::current().id())
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Stop accepting work, drain the queue, and join the workers.
    ///
    /// Idempotent. When called from one of this dispatcher's own workers, that
    /// worker is not joined (it exits once the queue is drained).
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());

        let handles = std::mem::take(&mut *self.workers.lock());
        if handles.is_empty() {
            return;
        }

        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            let name = handle.thread().name().map(str::to_string);
            if handle.join().is_err() {
                error!(worker = ?name, "Worker thread panicked");
            }
        }

        debug!("Worker dispatcher shut down");
    }
}

impl Dispatcher for WorkerDispatcher {
    fn dispatch(&self, work: Work) {
        if let Err(e) = self.try_dispatch(work) {
            error!(error = %e, "Dropping unit of work");
        }
    }
}

impl Drop for WorkerDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerDispatcher")
            .field("workers", &self.workers.lock().len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

fn run_worker(receiver: Receiver<Work>) {
    // Ends once every sender is gone and the queue is empty.
    for work in receiver.iter() {
        run_guarded(work);
    }
}

fn run_guarded(work: Work) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
        error!(
            panic = %panic_message(payload.as_ref()),
            "Unit of work panicked on worker"
        );
    }
}
