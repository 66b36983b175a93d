//! Fixed-size pool of background worker threads.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};
use hostbind_core::NativeError;

use crate::config::WorkerConfig;
use crate::error::{RuntimeError, RuntimeResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Named worker threads pulling jobs from a shared queue.
///
/// Jobs run in submission order as workers become free. Dropping the pool
/// lets queued jobs finish, then joins every worker.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(config: &WorkerConfig) -> RuntimeResult<Self> {
        let threads = config.resolved_threads();
        let (sender, receiver) = flume::unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let mut builder = thread::Builder::new().name(format!("{}-{index}", config.thread_name));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }
            let receiver = receiver.clone();
            let handle = builder
                .spawn(move || worker_loop(receiver))
                .map_err(RuntimeError::Spawn)?;
            workers.push(handle);
        }
        tracing::debug!(threads, name = %config.thread_name, "worker pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    pub fn with_threads(threads: usize) -> RuntimeResult<Self> {
        Self::new(&WorkerConfig::with_threads(threads))
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Number of jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }

    /// Queue a job.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) -> RuntimeResult<()> {
        let sender = self.sender.as_ref().ok_or(RuntimeError::PoolClosed)?;
        sender.send(Box::new(job)).map_err(|_| RuntimeError::PoolClosed)
    }
}

fn worker_loop(receiver: Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        #[cfg(feature = "profiling")]
        profiling::scope!("worker_job");
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            let err = NativeError::from_panic(payload);
            tracing::error!(error = %err, "worker job panicked");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::warn!("worker thread exited abnormally");
            }
        }
        tracing::debug!("worker pool stopped");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .field("queued", &self.queued())
            .finish()
    }
}
