//! Single-threaded host event loop.
//!
//! [`HostLoop`] owns the task queue of the host thread. Other threads reach
//! it through the [`HostEnv`] it hands out: cross-thread channel requests and
//! async completions are queued here and run when the loop is driven.

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use hostbind_core::{EnvGuard, HostEnv, HostScheduler, HostTask, Promise, SchedulerClosed, Settlement};
use parking_lot::Mutex;

use crate::error::{RuntimeError, RuntimeResult};

struct LoopShared {
    host: ThreadId,
    sender: Sender<HostTask>,
    /// `true` once the loop stops accepting tasks.
    closed: Mutex<bool>,
    refs: AtomicUsize,
}

impl HostScheduler for LoopShared {
    fn host_thread(&self) -> ThreadId {
        self.host
    }

    fn schedule(&self, task: HostTask) -> Result<(), SchedulerClosed> {
        // Sending under the gate means shutdown sees every accepted task.
        let closed = self.closed.lock();
        if *closed {
            return Err(SchedulerClosed);
        }
        self.sender.send(task).map_err(|_| SchedulerClosed)
    }

    fn is_closed(&self) -> bool {
        *self.closed.lock()
    }

    fn acquire(&self) {
        self.refs.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) {
        let previous = self
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => {
                // Wake a loop blocked in `run` so it can observe the zero count.
                let _ = self.schedule(Box::new(|| {}));
            }
            Ok(_) => {}
            Err(_) => tracing::warn!("host loop released more often than acquired"),
        }
    }
}

/// The host thread's event loop.
///
/// A loop is bound to the thread that created it and cannot be sent to
/// another thread. While it lives, its env is the thread's current env, so
/// host functions created on this thread attach to it.
///
/// # Example
///
/// ```
/// use hostbind_runtime::HostLoop;
///
/// let host = HostLoop::new();
/// let env = host.env();
/// std::thread::spawn(move || env.schedule(Box::new(|| println!("on host"))).unwrap())
///     .join()
///     .unwrap();
/// assert_eq!(host.run_until_idle(), 1);
/// ```
pub struct HostLoop {
    shared: Arc<LoopShared>,
    receiver: Receiver<HostTask>,
    env: HostEnv,
    /// Pending promises that already wake the loop when they settle.
    watched: RefCell<Vec<Promise>>,
    _current: EnvGuard,
}

impl HostLoop {
    /// Create a loop on the calling thread.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        let shared = Arc::new(LoopShared {
            host: thread::current().id(),
            sender,
            closed: Mutex::new(false),
            refs: AtomicUsize::new(0),
        });
        let env = HostEnv::new(shared.clone());
        let current = env.enter();
        tracing::debug!(thread = ?shared.host, "host loop created");
        Self {
            shared,
            receiver,
            env,
            watched: RefCell::new(Vec::new()),
            _current: current,
        }
    }

    /// Handle for scheduling onto this loop from any thread.
    pub fn env(&self) -> HostEnv {
        self.env.clone()
    }

    /// Number of outstanding keep-alive references.
    pub fn pending_refs(&self) -> usize {
        self.shared.refs.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Number of tasks waiting to run.
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    /// Run every queued task, including tasks queued while running.
    ///
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            count += 1;
        }
        count
    }

    /// Run tasks until no keep-alive references remain.
    ///
    /// Pending async operations and live cross-thread channels hold
    /// references. Returns immediately after draining the queue when there
    /// are none.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&self) {
        loop {
            self.run_until_idle();
            if self.pending_refs() == 0 || self.is_closed() {
                break;
            }
            match self.receiver.recv() {
                Ok(task) => task(),
                Err(_) => break,
            }
        }
        tracing::debug!("host loop idle");
    }

    /// Drive the loop until `promise` settles.
    pub fn block_on(&self, promise: &Promise) -> RuntimeResult<Settlement> {
        self.wake_on_settle(promise);
        loop {
            if let Some(settlement) = promise.settlement() {
                return Ok(settlement);
            }
            if self.is_closed() {
                return Err(RuntimeError::Closed(SchedulerClosed));
            }
            match self.receiver.recv() {
                Ok(task) => task(),
                Err(_) => return Err(RuntimeError::Closed(SchedulerClosed)),
            }
        }
    }

    /// Drive the loop until `promise` settles or `timeout` elapses.
    ///
    /// Returns `None` on timeout.
    pub fn block_on_timeout(&self, promise: &Promise, timeout: Duration) -> Option<Settlement> {
        self.wake_on_settle(promise);
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(settlement) = promise.settlement() {
                return Some(settlement);
            }
            match self.receiver.recv_deadline(deadline) {
                Ok(task) => task(),
                Err(RecvTimeoutError::Timeout) => return promise.settlement(),
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn wake_on_settle(&self, promise: &Promise) {
        if !promise.is_pending() {
            return;
        }
        let mut watched = self.watched.borrow_mut();
        watched.retain(Promise::is_pending);
        if watched.iter().any(|p| p.ptr_eq(promise)) {
            return;
        }
        watched.push(promise.clone());
        let shared = self.shared.clone();
        promise.on_settled(move |_| {
            let _ = shared.schedule(Box::new(|| {}));
        });
    }

    /// Stop accepting tasks and drop everything still queued.
    ///
    /// Threads blocked on a queued request observe the loop as closed.
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            let mut closed = self.shared.closed.lock();
            if *closed {
                return;
            }
            *closed = true;
        }
        self.watched.borrow_mut().clear();
        let dropped = self.receiver.drain().count();
        tracing::debug!(dropped, "host loop shut down");
    }
}

impl Default for HostLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HostLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for HostLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostLoop")
            .field("host", &self.shared.host)
            .field("queued", &self.queued())
            .field("refs", &self.pending_refs())
            .field("closed", &self.is_closed())
            .finish()
    }
}
