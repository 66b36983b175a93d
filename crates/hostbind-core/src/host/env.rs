//! Host thread identity and task scheduling.
//!
//! The core never talks to an event loop directly. Everything that must run
//! on the host thread goes through a [`HostScheduler`], wrapped in a
//! cloneable [`HostEnv`] handle. The runtime crate provides the production
//! scheduler; tests can plug in their own.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use thiserror::Error;

/// A unit of work posted to the host thread.
pub type HostTask = Box<dyn FnOnce() + Send + 'static>;

/// The host event loop no longer accepts tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("host event loop is closed")]
pub struct SchedulerClosed;

/// Scheduling capabilities of a host event loop.
pub trait HostScheduler: Send + Sync + 'static {
    /// The thread that runs the loop.
    fn host_thread(&self) -> ThreadId;

    /// Queue a task for execution on the host thread.
    fn schedule(&self, task: HostTask) -> Result<(), SchedulerClosed>;

    /// Whether the loop has shut down.
    fn is_closed(&self) -> bool;

    /// Register a reference that keeps the loop alive.
    fn acquire(&self);

    /// Drop a reference registered with [`acquire`](Self::acquire).
    fn release(&self);
}

thread_local! {
    static CURRENT: RefCell<Option<HostEnv>> = const { RefCell::new(None) };
}

/// Cloneable handle to a host scheduler.
#[derive(Clone)]
pub struct HostEnv {
    scheduler: Arc<dyn HostScheduler>,
}

impl HostEnv {
    pub fn new(scheduler: Arc<dyn HostScheduler>) -> Self {
        Self { scheduler }
    }

    /// The env installed on the calling thread, if any.
    pub fn current() -> Option<HostEnv> {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Install this env as the calling thread's current env.
    ///
    /// The previous env is restored when the guard drops.
    pub fn enter(&self) -> EnvGuard {
        let previous = CURRENT.with(|current| current.replace(Some(self.clone())));
        EnvGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    pub fn host_thread(&self) -> ThreadId {
        self.scheduler.host_thread()
    }

    /// Whether the calling thread is the host thread.
    pub fn on_host_thread(&self) -> bool {
        thread::current().id() == self.scheduler.host_thread()
    }

    pub fn schedule(&self, task: HostTask) -> Result<(), SchedulerClosed> {
        self.scheduler.schedule(task)
    }

    /// Run `task` now if on the host thread, otherwise queue it.
    pub fn run_on_host(&self, task: HostTask) -> Result<(), SchedulerClosed> {
        if self.on_host_thread() {
            task();
            Ok(())
        } else {
            self.schedule(task)
        }
    }

    pub fn is_closed(&self) -> bool {
        self.scheduler.is_closed()
    }

    pub fn acquire(&self) {
        self.scheduler.acquire();
    }

    pub fn release(&self) {
        self.scheduler.release();
    }

    /// Whether both handles point at the same scheduler.
    pub fn same_env(&self, other: &HostEnv) -> bool {
        Arc::ptr_eq(&self.scheduler, &other.scheduler)
    }
}

impl fmt::Debug for HostEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEnv")
            .field("host_thread", &self.host_thread())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Restores the previously current env on drop.
#[must_use = "the env is uninstalled when the guard drops"]
pub struct EnvGuard {
    previous: Option<HostEnv>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}
