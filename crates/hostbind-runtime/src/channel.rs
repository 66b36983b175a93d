//! Calling host functions from any thread.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use hostbind_core::{
    ConversionError, FromHost, HostEnv, HostFunction, HostKinds, HostValue, IntoHostArgs,
};
use parking_lot::Mutex;

use crate::error::ChannelError;

#[derive(Debug)]
struct ChannelState {
    released: bool,
    /// Off-thread requests queued or running on the host.
    in_flight: usize,
    /// Whether the loop's keep-alive reference is still held.
    holds_ref: bool,
}

struct ChannelInner {
    function: HostFunction,
    env: HostEnv,
    /// Held for a whole off-thread round trip, one request at a time.
    call_lock: Mutex<()>,
    state: Mutex<ChannelState>,
}

impl ChannelInner {
    fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Mark the channel released. The keep-alive reference goes once no
    /// request is in flight.
    fn release(&self) -> bool {
        let drop_ref = {
            let mut state = self.state.lock();
            if state.released {
                return false;
            }
            state.released = true;
            state.in_flight == 0 && std::mem::take(&mut state.holds_ref)
        };
        if drop_ref {
            self.env.release();
        }
        tracing::debug!(
            function = %self.function.name(),
            deferred = !drop_ref,
            "cross-thread channel released"
        );
        true
    }

    fn end_request(&self) {
        let drop_ref = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.released && state.in_flight == 0 && std::mem::take(&mut state.holds_ref)
        };
        if drop_ref {
            self.env.release();
        }
    }
}

impl Drop for ChannelInner {
    fn drop(&mut self) {
        self.release();
    }
}

/// An accepted off-thread request. Dropping it, whether the host ran the
/// request or discarded it, ends the request.
struct InFlight(Arc<ChannelInner>);

impl InFlight {
    fn begin(inner: &Arc<ChannelInner>) -> Option<Self> {
        let mut state = inner.state.lock();
        if state.released {
            return None;
        }
        state.in_flight += 1;
        Some(Self(inner.clone()))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.end_request();
    }
}

/// A host function callable from any thread.
///
/// On the host thread a call runs in place. Anywhere else the call is queued
/// on the host loop and the calling thread blocks until the host has run the
/// function and converted its result. Requests made through one channel are
/// served one at a time, in the order they acquire the channel.
///
/// While a channel is live it keeps its host loop running. Release it with
/// [`release`](Self::release) or by dropping every clone.
///
/// `Args` is the tuple of native arguments converted on the host thread, and
/// `R` is the native result type.
pub struct CrossThreadChannel<Args, R> {
    inner: Arc<ChannelInner>,
    _marker: PhantomData<fn(Args) -> R>,
}

fn attached_env(function: &HostFunction) -> Result<HostEnv, ChannelError> {
    let env = function.env().cloned().ok_or_else(|| ChannelError::Detached {
        name: function.name().to_string(),
    })?;
    if !env.on_host_thread() {
        return Err(ChannelError::WrongThread);
    }
    if env.is_closed() {
        return Err(ChannelError::Closed);
    }
    Ok(env)
}

fn invoke<Args, R>(function: &HostFunction, args: Args) -> Result<R, ChannelError>
where
    Args: IntoHostArgs,
    R: FromHost,
{
    let result = function
        .call(&args.into_host_args())
        .map_err(ChannelError::Host)?;
    if !R::is_convertible(&result) {
        return Err(ChannelError::Conversion(ConversionError::mismatch(
            R::TYPE_NAME,
            result.kind_name(),
        )));
    }
    Ok(R::from_host(&result)?)
}

impl<Args, R> CrossThreadChannel<Args, R>
where
    Args: IntoHostArgs + Send + 'static,
    R: FromHost + Send + 'static,
{
    /// Wrap `function` for cross-thread use.
    ///
    /// Must be called on the function's host thread.
    pub fn new(function: HostFunction) -> Result<Self, ChannelError> {
        let env = attached_env(&function)?;
        env.acquire();
        Ok(Self {
            inner: Arc::new(ChannelInner {
                function,
                env,
                call_lock: Mutex::new(()),
                state: Mutex::new(ChannelState {
                    released: false,
                    in_flight: 0,
                    holds_ref: true,
                }),
            }),
            _marker: PhantomData,
        })
    }

    /// Call the host function and wait for its result.
    pub fn call(&self, args: Args) -> Result<R, ChannelError> {
        if self.inner.env.on_host_thread() {
            if self.is_released() {
                return Err(ChannelError::Closed);
            }
            return invoke(&self.inner.function, args);
        }

        let _serial = self.inner.call_lock.lock();
        // Counted before it is queued, so a concurrent release keeps the
        // loop alive until this request is answered.
        let request = InFlight::begin(&self.inner).ok_or(ChannelError::Closed)?;
        let (reply, response) = flume::bounded(1);
        let function = self.inner.function.clone();
        self.inner
            .env
            .schedule(Box::new(move || {
                let _request = request;
                let _ = reply.send(invoke::<Args, R>(&function, args));
            }))
            .map_err(|_| ChannelError::Closed)?;

        response.recv().unwrap_or_else(|_| {
            tracing::debug!(
                function = %self.inner.function.name(),
                "host loop shut down before serving channel request"
            );
            Err(ChannelError::Closed)
        })
    }
}

impl<Args, R> CrossThreadChannel<Args, R> {
    /// Detach from the host loop.
    ///
    /// New calls fail with [`ChannelError::Closed`]. Requests already queued
    /// are still served, and the loop stays alive until they are answered.
    /// Returns `false`, without side effects, if already released.
    pub fn release(&self) -> bool {
        let released = self.inner.release();
        if !released {
            tracing::warn!(
                function = %self.inner.function.name(),
                "cross-thread channel released twice"
            );
        }
        released
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_released()
    }

    pub fn function(&self) -> &HostFunction {
        &self.inner.function
    }
}

impl<Args, R> Clone for CrossThreadChannel<Args, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<Args, R> fmt::Debug for CrossThreadChannel<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossThreadChannel")
            .field("function", &self.inner.function.name())
            .field("released", &self.is_released())
            .finish()
    }
}

/// Host functions arrive already wrapped, so async natives can take a
/// channel parameter directly.
impl<Args, R> FromHost for CrossThreadChannel<Args, R>
where
    Args: IntoHostArgs + Send + 'static,
    R: FromHost + Send + 'static,
{
    const TYPE_NAME: &'static str = "function";
    const ACCEPTS: HostKinds = HostKinds::FUNCTION;

    fn is_convertible(value: &HostValue) -> bool {
        value.as_function().is_some_and(|f| attached_env(f).is_ok())
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        let function = value
            .as_function()
            .ok_or_else(|| ConversionError::mismatch(Self::TYPE_NAME, value.kind_name()))?;
        Self::new(function.clone()).map_err(|err| match err {
            ChannelError::Detached { name } => ConversionError::Detached { name },
            other => ConversionError::failed(other.to_string()),
        })
    }
}
