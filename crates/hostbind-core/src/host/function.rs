//! Host-callable functions.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::call::CallContext;
use crate::error::{HostError, HostResult};

use super::{HostEnv, HostValue};

type Callback = dyn Fn(&CallContext<'_>) -> HostResult<HostValue> + Send + Sync;

/// A function value living in the host runtime.
///
/// A host function is bound to the thread that created it. Calling it from
/// any other thread fails; off-thread callers go through a cross-thread
/// channel instead.
#[derive(Clone)]
pub struct HostFunction {
    inner: Arc<FunctionInner>,
}

struct FunctionInner {
    name: String,
    home: ThreadId,
    env: Option<HostEnv>,
    callback: Box<Callback>,
}

impl HostFunction {
    /// Create a function on the calling thread.
    ///
    /// The function is attached to the thread's current [`HostEnv`], if one
    /// is installed.
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        Self::build(name.into(), HostEnv::current(), callback)
    }

    /// Create a function attached to an explicit env.
    pub fn with_env<F>(env: HostEnv, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        Self::build(name.into(), Some(env), callback)
    }

    fn build<F>(name: String, env: Option<HostEnv>, callback: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        let home = env
            .as_ref()
            .map(HostEnv::host_thread)
            .unwrap_or_else(|| thread::current().id());
        Self {
            inner: Arc::new(FunctionInner {
                name,
                home,
                env,
                callback: Box::new(callback),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn env(&self) -> Option<&HostEnv> {
        self.inner.env.as_ref()
    }

    pub fn home_thread(&self) -> ThreadId {
        self.inner.home
    }

    /// Whether the calling thread may invoke this function directly.
    pub fn is_home_thread(&self) -> bool {
        thread::current().id() == self.inner.home
    }

    /// Invoke the function with host arguments.
    pub fn call(&self, args: &[HostValue]) -> HostResult<HostValue> {
        if !self.is_home_thread() {
            tracing::debug!(function = %self.inner.name, "host function called off its home thread");
            return Err(HostError::error(format!(
                "invalid call to '{}' - use CrossThreadChannel",
                self.inner.name
            )));
        }
        (self.inner.callback)(&CallContext::new(args))
    }

    /// Whether both handles refer to the same function.
    pub fn ptr_eq(&self, other: &HostFunction) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for HostFunction {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.inner.name)
            .field("home", &self.inner.home)
            .finish_non_exhaustive()
    }
}
