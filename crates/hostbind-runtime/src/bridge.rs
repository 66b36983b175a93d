//! Running native work on workers with promise-style completion.
//!
//! A submitted job runs on a [`WorkerPool`] thread. Its outcome hops back to
//! the host thread through the [`HostEnv`], where the value is converted and
//! the promise settled:
//!
//! | Outcome | Settlement |
//! |---|---|
//! | `Ok(value)` | resolved with `value` |
//! | `Err(e)` or panic | rejected `{result: message, native: true, status: "error"}` |
//! | returned after cancel | rejected `{result: value, native: true, status: "canceled"}` |
//! | canceled before start | rejected `{status: "canceled"}` |
//!
//! Each pending operation holds a keep-alive reference on the host loop,
//! released once its promise settles.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use hostbind_core::{
    ArgList, BindError, CallContext, CallError, Deferred, HostEnv, HostFunction, HostObject,
    HostValue, IntoHost, NativeError, NativeFn, NativeFnWith, NativeReturn, Promise, Rejection,
    Settlement,
};

use crate::cancel::CancellationToken;
use crate::config::WorkerConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::worker::WorkerPool;

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;
const CANCELED: u8 = 3;

/// Settles one promise on the host thread, exactly once.
struct Completion {
    env: HostEnv,
    deferred: Deferred,
    done: AtomicBool,
}

impl Completion {
    fn finish(&self, settlement: Settlement) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        self.deferred.settle(settlement);
        self.env.release();
    }

    /// Build the settlement on the host thread and settle with it.
    fn post(self: &Arc<Self>, make: impl FnOnce() -> Settlement + Send + 'static) {
        let this = self.clone();
        let task = Box::new(move || this.finish(make()));
        if self.env.run_on_host(task).is_err() {
            tracing::warn!("host loop closed; async completion dropped");
            if !self.done.swap(true, Ordering::AcqRel) {
                self.env.release();
            }
        }
    }
}

struct JobControl {
    state: AtomicU8,
    token: Option<CancellationToken>,
    completion: Arc<Completion>,
}

impl JobControl {
    fn is_canceled(&self) -> bool {
        self.token.as_ref().is_some_and(CancellationToken::is_canceled)
    }
}

/// Cancels one async operation.
///
/// Cancelling after the operation finished, or more than once, does nothing.
#[derive(Clone)]
pub struct Canceller {
    control: Arc<JobControl>,
}

impl Canceller {
    pub fn cancel(&self) {
        let control = &self.control;
        let state = control.state.load(Ordering::Acquire);
        if state == FINISHED || state == CANCELED {
            return;
        }
        if let Some(token) = &control.token {
            token.cancel();
        }
        if control
            .state
            .compare_exchange(QUEUED, CANCELED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::debug!("async job canceled before start");
            control
                .completion
                .post(|| Err(Rejection::canceled(false, None).into_host()));
        }
    }

    /// A host function that calls [`cancel`](Self::cancel).
    pub fn to_host_function(&self) -> HostFunction {
        let canceller = self.clone();
        HostFunction::with_env(self.control.completion.env.clone(), "cancel", move |_| {
            canceller.cancel();
            Ok(HostValue::Undefined)
        })
    }
}

impl fmt::Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller")
            .field("state", &self.control.state.load(Ordering::Relaxed))
            .finish()
    }
}

/// Host-side handle of a submitted operation.
#[derive(Debug, Clone)]
pub struct AsyncHandle {
    promise: Promise,
    canceller: Option<Canceller>,
}

impl AsyncHandle {
    pub fn promise(&self) -> &Promise {
        &self.promise
    }

    pub fn canceller(&self) -> Option<&Canceller> {
        self.canceller.as_ref()
    }

    /// Cancel the operation. Returns `false` if the handle is not cancellable.
    pub fn cancel(&self) -> bool {
        match &self.canceller {
            Some(canceller) => {
                canceller.cancel();
                true
            }
            None => false,
        }
    }
}

/// A plain promise, or `{promise, cancel}` when cancellable.
impl IntoHost for AsyncHandle {
    fn into_host(self) -> HostValue {
        match self.canceller {
            None => HostValue::Promise(self.promise),
            Some(canceller) => HostValue::Object(
                HostObject::new()
                    .with("promise", self.promise)
                    .with("cancel", canceller.to_host_function()),
            ),
        }
    }
}

/// Submits native jobs to a worker pool and settles their promises on the
/// host thread.
#[derive(Clone)]
pub struct AsyncBridge {
    env: HostEnv,
    pool: Arc<WorkerPool>,
}

impl AsyncBridge {
    pub fn new(env: HostEnv, pool: Arc<WorkerPool>) -> Self {
        Self { env, pool }
    }

    /// Start a dedicated pool for this bridge.
    pub fn from_config(env: HostEnv, config: &WorkerConfig) -> RuntimeResult<Self> {
        Ok(Self::new(env, Arc::new(WorkerPool::new(config)?)))
    }

    pub fn env(&self) -> &HostEnv {
        &self.env
    }

    /// Run `job` on a worker. The handle cannot be canceled.
    pub fn submit<F, R>(&self, job: F) -> RuntimeResult<AsyncHandle>
    where
        F: FnOnce() -> R + Send + 'static,
        R: NativeReturn,
        R::Value: Send + 'static,
    {
        self.spawn(None, false, move |_| job())
    }

    /// Run `job` on a worker, handing it the operation's cancellation token.
    pub fn submit_cancellable<F, R>(&self, job: F) -> RuntimeResult<AsyncHandle>
    where
        F: FnOnce(CancellationToken) -> R + Send + 'static,
        R: NativeReturn,
        R::Value: Send + 'static,
    {
        self.spawn(Some(CancellationToken::new()), true, move |token| {
            job(token.unwrap_or_default())
        })
    }

    /// Run `job` on a worker. Cancelling only prevents a queued job from
    /// starting.
    pub fn submit_abortable<F, R>(&self, job: F) -> RuntimeResult<AsyncHandle>
    where
        F: FnOnce() -> R + Send + 'static,
        R: NativeReturn,
        R::Value: Send + 'static,
    {
        self.spawn(None, true, move |_| job())
    }

    fn spawn<F, R>(
        &self,
        token: Option<CancellationToken>,
        cancellable: bool,
        job: F,
    ) -> RuntimeResult<AsyncHandle>
    where
        F: FnOnce(Option<CancellationToken>) -> R + Send + 'static,
        R: NativeReturn,
        R::Value: Send + 'static,
    {
        if self.env.is_closed() {
            return Err(RuntimeError::Closed(hostbind_core::SchedulerClosed));
        }
        let (promise, deferred) = Promise::pending();
        self.env.acquire();
        let control = Arc::new(JobControl {
            state: AtomicU8::new(QUEUED),
            token,
            completion: Arc::new(Completion {
                env: self.env.clone(),
                deferred,
                done: AtomicBool::new(false),
            }),
        });

        let worker_control = control.clone();
        let submitted = self.pool.execute(move || run_job(&worker_control, job));
        if let Err(err) = submitted {
            control.completion.done.store(true, Ordering::Release);
            self.env.release();
            return Err(err);
        }

        Ok(AsyncHandle {
            promise,
            canceller: cancellable.then(|| Canceller { control }),
        })
    }

    /// Bind `function` as an async entry point.
    pub fn function<Args, F>(&self, name: impl Into<String>, function: F) -> AsyncFunction<Args>
    where
        Args: ArgList + Send,
        F: NativeFn<Args>,
        <F::Output as NativeReturn>::Value: Send + 'static,
    {
        let runner: Arc<Runner<Args>> = Arc::new(move |args, _token| {
            function
                .invoke(args)
                .into_native_result()
                .map(HostThunk::new)
        });
        AsyncFunction::build(self.clone(), name.into(), Mode::Plain, runner)
    }

    /// Bind `function` as a cancellable async entry point.
    ///
    /// The function's first parameter is the operation's
    /// [`CancellationToken`]; host arguments bind to the rest.
    pub fn cancellable<Args, F>(&self, name: impl Into<String>, function: F) -> AsyncFunction<Args>
    where
        Args: ArgList + Send,
        F: NativeFnWith<CancellationToken, Args>,
        <F::Output as NativeReturn>::Value: Send + 'static,
    {
        let runner: Arc<Runner<Args>> = Arc::new(move |args, token| {
            function
                .invoke(token.unwrap_or_default(), args)
                .into_native_result()
                .map(HostThunk::new)
        });
        AsyncFunction::build(self.clone(), name.into(), Mode::Cancellable, runner)
    }

    /// Bind `function` as an async entry point whose handle can prevent
    /// the start.
    pub fn abortable<Args, F>(&self, name: impl Into<String>, function: F) -> AsyncFunction<Args>
    where
        Args: ArgList + Send,
        F: NativeFn<Args>,
        <F::Output as NativeReturn>::Value: Send + 'static,
    {
        let runner: Arc<Runner<Args>> = Arc::new(move |args, _token| {
            function
                .invoke(args)
                .into_native_result()
                .map(HostThunk::new)
        });
        AsyncFunction::build(self.clone(), name.into(), Mode::Abortable, runner)
    }
}

impl fmt::Debug for AsyncBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncBridge")
            .field("env", &self.env)
            .field("pool", &self.pool)
            .finish()
    }
}

fn run_job<F, R>(control: &Arc<JobControl>, job: F)
where
    F: FnOnce(Option<CancellationToken>) -> R,
    R: NativeReturn,
    R::Value: Send + 'static,
{
    if control
        .state
        .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return;
    }

    let token = control.token.clone();
    let result = panic::catch_unwind(AssertUnwindSafe(move || job(token).into_native_result()));
    control.state.store(FINISHED, Ordering::Release);

    let canceled = control.is_canceled();
    let outcome = match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(NativeError::from_panic(payload).to_string()),
    };
    if let Err(message) = &outcome {
        tracing::debug!(error = %message, "async job failed");
    }

    control.completion.post(move || match outcome {
        Ok(value) if canceled => Err(Rejection::canceled(true, Some(value.into_host())).into_host()),
        Ok(value) => Ok(value.into_host()),
        Err(message) => Err(Rejection::error(message).into_host()),
    });
}

/// A worker result whose host conversion is deferred to the host thread.
struct HostThunk(Box<dyn FnOnce() -> HostValue + Send>);

impl HostThunk {
    fn new<T: IntoHost + Send + 'static>(value: T) -> Self {
        HostThunk(Box::new(move || value.into_host()))
    }
}

impl IntoHost for HostThunk {
    fn into_host(self) -> HostValue {
        (self.0)()
    }
}

type Runner<Args> =
    dyn Fn(Args, Option<CancellationToken>) -> Result<HostThunk, NativeError> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Plain,
    Cancellable,
    Abortable,
}

/// A native function exposed as an async host entry point.
///
/// Arguments are validated and converted on the host thread when called;
/// binding errors are returned immediately and never reach a worker.
pub struct AsyncFunction<Args: ArgList> {
    name: Arc<str>,
    bridge: AsyncBridge,
    mode: Mode,
    runner: Arc<Runner<Args>>,
    defaults: Args::Defaults,
}

impl<Args: ArgList + Send> AsyncFunction<Args> {
    fn build(bridge: AsyncBridge, name: String, mode: Mode, runner: Arc<Runner<Args>>) -> Self {
        Self {
            name: name.into(),
            bridge,
            mode,
            runner,
            defaults: Args::Defaults::default(),
        }
    }

    /// Declare trailing default values.
    pub fn with_defaults(mut self, defaults: Args::Defaults) -> Result<Self, BindError> {
        Args::default_count(&defaults)?;
        self.defaults = defaults;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cancellable(&self) -> bool {
        self.mode != Mode::Plain
    }

    /// Bind the arguments and submit the call.
    pub fn call(&self, ctx: &CallContext<'_>) -> Result<AsyncHandle, CallError> {
        let args = Args::bind_declared(ctx.args(), &self.defaults).inspect_err(|err| {
            tracing::debug!(function = %self.name, error = %err, "async argument binding failed");
        })?;
        let runner = self.runner.clone();
        let handle = match self.mode {
            Mode::Plain => self.bridge.submit(move || runner(args, None)),
            Mode::Abortable => self.bridge.submit_abortable(move || runner(args, None)),
            Mode::Cancellable => self
                .bridge
                .submit_cancellable(move |token| runner(args, Some(token))),
        };
        tracing::trace!(function = %self.name, "async call submitted");
        handle.map_err(|err| CallError::Native(err.into()))
    }

    /// Expose as a host function on the bridge's host loop.
    pub fn to_host_function(&self) -> HostFunction {
        let function = self.clone();
        HostFunction::with_env(self.bridge.env.clone(), self.name.to_string(), move |ctx| {
            function
                .call(ctx)
                .map(IntoHost::into_host)
                .map_err(CallError::into_host_error)
        })
    }
}

impl<Args: ArgList> Clone for AsyncFunction<Args> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            bridge: self.bridge.clone(),
            mode: self.mode,
            runner: self.runner.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

impl<Args: ArgList> fmt::Debug for AsyncFunction<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFunction")
            .field("name", &self.name)
            .field("params", &Args::type_names())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<Args: ArgList + Send> IntoHost for AsyncFunction<Args> {
    fn into_host(self) -> HostValue {
        HostValue::Function(self.to_host_function())
    }
}
