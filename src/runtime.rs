use std::sync::Arc;
use std::time::Duration;

use hostbind_core::{HostEnv, Promise, Settlement};
use hostbind_runtime::logging::{self, WorkerGuard};
use hostbind_runtime::{AsyncBridge, HostLoop, RuntimeConfig, RuntimeResult, WorkerPool};

/// A host loop on the calling thread plus a worker pool feeding it.
///
/// Like [`HostLoop`], a runtime belongs to the thread that created it.
/// Dropping it closes the loop first, so workers blocked in a
/// [`CrossThreadChannel`](hostbind_runtime::CrossThreadChannel) call see
/// [`ChannelError::Closed`](hostbind_runtime::ChannelError::Closed), and then
/// joins the workers.
#[derive(Debug)]
pub struct Runtime {
    bridge: AsyncBridge,
    host: HostLoop,
}

impl Runtime {
    pub fn new(config: &RuntimeConfig) -> RuntimeResult<Self> {
        let host = HostLoop::new();
        let pool = Arc::new(WorkerPool::new(&config.workers)?);
        tracing::debug!(workers = pool.threads(), "runtime started");
        Ok(Self {
            bridge: AsyncBridge::new(host.env(), pool),
            host,
        })
    }

    /// Install the global subscriber described by `config.logging`.
    ///
    /// ```no_run
    /// use hostbind::{Runtime, RuntimeConfig};
    ///
    /// let config = RuntimeConfig::load("hostbind.toml")?;
    /// let _guard = Runtime::init_logging(&config)?;
    /// let runtime = Runtime::new(&config)?;
    /// # Ok::<(), hostbind::RuntimeError>(())
    /// ```
    pub fn init_logging(config: &RuntimeConfig) -> RuntimeResult<WorkerGuard> {
        logging::init_logging(config.logging.to_log_config()?)
    }

    pub fn host(&self) -> &HostLoop {
        &self.host
    }

    pub fn bridge(&self) -> &AsyncBridge {
        &self.bridge
    }

    pub fn env(&self) -> HostEnv {
        self.host.env()
    }

    /// Run until no async operation or channel keeps the loop alive.
    pub fn run(&self) {
        self.host.run();
    }

    pub fn block_on(&self, promise: &Promise) -> RuntimeResult<Settlement> {
        self.host.block_on(promise)
    }

    pub fn block_on_timeout(&self, promise: &Promise, timeout: Duration) -> Option<Settlement> {
        self.host.block_on_timeout(promise, timeout)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.host.shutdown();
    }
}
