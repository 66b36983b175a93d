//! Bound native entry points.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{ArgList, CallContext, NativeFn, NativeFnWith, NativeMethod, NativeMethodMut, NativeReturn};
use crate::convert::IntoHost;
use crate::error::{BindError, CallError, NativeError};
use crate::host::{HostFunction, HostValue};

type Invoker<Args> = dyn Fn(Args) -> Result<HostValue, NativeError> + Send + Sync;

/// A native callable paired with its parameter list.
///
/// Each bound function owns its registration state: the callable, the
/// receiver for methods, and any declared trailing defaults.
///
/// # Example
///
/// ```
/// use hostbind_core::{BoundFunction, CallContext, HostValue};
///
/// let add = BoundFunction::new("add", |a: i32, b: i32| a + b)
///     .with_defaults((Some(1), Some(2)))
///     .unwrap();
///
/// let call = |args: &[HostValue]| add.invoke(&CallContext::new(args)).unwrap();
/// assert_eq!(call(&[]), HostValue::Number(3.0));
/// assert_eq!(call(&[HostValue::from(10)]), HostValue::Number(12.0));
/// assert_eq!(call(&[HostValue::from(10), HostValue::from(20)]), HostValue::Number(30.0));
/// ```
pub struct BoundFunction<Args: ArgList> {
    name: Arc<str>,
    invoker: Arc<Invoker<Args>>,
    defaults: Args::Defaults,
}

impl<Args: ArgList> BoundFunction<Args> {
    /// Bind a free function or closure.
    pub fn new<F>(name: impl Into<String>, function: F) -> Self
    where
        F: NativeFn<Args>,
    {
        Self::from_invoker(name.into(), move |args| {
            function
                .invoke(args)
                .into_native_result()
                .map(IntoHost::into_host)
        })
    }

    /// Bind a method with a shared receiver.
    pub fn method<T, F>(name: impl Into<String>, receiver: Arc<T>, method: F) -> Self
    where
        T: Send + Sync + 'static,
        F: NativeMethod<T, Args>,
    {
        Self::from_invoker(name.into(), move |args| {
            method
                .invoke(&receiver, args)
                .into_native_result()
                .map(IntoHost::into_host)
        })
    }

    /// Bind a method with an exclusive receiver.
    ///
    /// The receiver stays locked for the duration of each call, so the method
    /// must not re-enter a function bound to the same receiver.
    pub fn method_mut<T, F>(name: impl Into<String>, receiver: Arc<Mutex<T>>, method: F) -> Self
    where
        T: Send + 'static,
        F: NativeMethodMut<T, Args>,
    {
        Self::from_invoker(name.into(), move |args| {
            let mut guard = receiver.lock();
            method
                .invoke(&mut guard, args)
                .into_native_result()
                .map(IntoHost::into_host)
        })
    }

    /// Bind a method that consumes its receiver.
    ///
    /// The first call moves the receiver into the method; every later call
    /// fails with [`NativeError::ReceiverConsumed`].
    pub fn method_once<T, F>(name: impl Into<String>, receiver: T, method: F) -> Self
    where
        T: Send + 'static,
        F: NativeFnWith<T, Args>,
    {
        let slot = Mutex::new(Some(receiver));
        Self::from_invoker(name.into(), move |args| {
            let receiver = slot.lock().take().ok_or(NativeError::ReceiverConsumed {
                type_name: std::any::type_name::<T>(),
            })?;
            method
                .invoke(receiver, args)
                .into_native_result()
                .map(IntoHost::into_host)
        })
    }

    fn from_invoker(
        name: String,
        invoker: impl Fn(Args) -> Result<HostValue, NativeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            invoker: Arc::new(invoker),
            defaults: Args::Defaults::default(),
        }
    }

    /// Declare trailing default values.
    ///
    /// Fails with [`BindError::InvalidDefaults`] unless the defaults cover a
    /// trailing run of parameters.
    pub fn with_defaults(mut self, defaults: Args::Defaults) -> Result<Self, BindError> {
        Args::default_count(&defaults)?;
        self.defaults = defaults;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        Args::LEN
    }

    /// Fewest arguments a call may supply.
    pub fn required_arity(&self) -> usize {
        Args::LEN - Args::default_count(&self.defaults).unwrap_or(0)
    }

    /// Bind host arguments using the declared defaults.
    ///
    /// A call with M arguments takes the last N - M declared defaults.
    pub fn bind_args(&self, ctx: &CallContext<'_>) -> Result<Args, BindError> {
        Args::bind_declared(ctx.args(), &self.defaults)
    }

    /// Validate, convert and invoke with the declared defaults.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(&self, ctx: &CallContext<'_>) -> Result<HostValue, CallError> {
        let args = self.bind_args(ctx).inspect_err(|err| self.log_bind_failure(err))?;
        Ok(self.call_native(args)?)
    }

    /// Validate, convert and invoke with defaults supplied by this call site.
    ///
    /// Unlike [`invoke`](Self::invoke), the argument count must match exactly
    /// the parameters not covered by `defaults`.
    pub fn invoke_with_defaults(
        &self,
        ctx: &CallContext<'_>,
        defaults: &Args::Defaults,
    ) -> Result<HostValue, CallError> {
        let args = Args::bind(ctx.args(), defaults).inspect_err(|err| self.log_bind_failure(err))?;
        Ok(self.call_native(args)?)
    }

    /// Invoke with an already bound parameter tuple.
    pub fn call_native(&self, args: Args) -> Result<HostValue, NativeError> {
        tracing::trace!(function = %self.name, "invoking native function");
        (self.invoker)(args)
    }

    /// Expose this binding as a host function on the calling thread.
    pub fn to_host_function(&self) -> HostFunction {
        let bound = self.clone();
        HostFunction::new(self.name.to_string(), move |ctx| {
            bound.invoke(ctx).map_err(CallError::into_host_error)
        })
    }

    fn log_bind_failure(&self, err: &BindError) {
        tracing::debug!(function = %self.name, error = %err, "argument binding failed");
    }
}

impl<Args: ArgList> Clone for BoundFunction<Args> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            invoker: self.invoker.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

impl<Args: ArgList> fmt::Debug for BoundFunction<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFunction")
            .field("name", &self.name)
            .field("params", &Args::type_names())
            .field("required", &self.required_arity())
            .finish_non_exhaustive()
    }
}

impl<Args: ArgList> IntoHost for BoundFunction<Args> {
    fn into_host(self) -> HostValue {
        HostValue::Function(self.to_host_function())
    }
}

/// Bind and invoke `function` without defaults.
pub fn typed_call<Args, F>(ctx: &CallContext<'_>, function: &F) -> Result<HostValue, CallError>
where
    Args: ArgList,
    F: NativeFn<Args>,
{
    typed_call_with_defaults(ctx, function, &Args::Defaults::default())
}

/// Bind and invoke `function`, filling trailing parameters from `defaults`.
pub fn typed_call_with_defaults<Args, F>(
    ctx: &CallContext<'_>,
    function: &F,
    defaults: &Args::Defaults,
) -> Result<HostValue, CallError>
where
    Args: ArgList,
    F: NativeFn<Args>,
{
    let args = Args::bind(ctx.args(), defaults)?;
    Ok(function.invoke(args).into_native_result()?.into_host())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::HostErrorKind;

    fn call<Args: ArgList>(f: &BoundFunction<Args>, args: &[HostValue]) -> Result<HostValue, CallError> {
        f.invoke(&CallContext::new(args))
    }

    struct Account {
        balance: i64,
    }

    impl Account {
        fn balance(&self) -> i64 {
            self.balance
        }

        fn deposit(&mut self, amount: i64) -> i64 {
            self.balance += amount;
            self.balance
        }

        fn close(self) -> String {
            format!("closed with {}", self.balance)
        }
    }

    #[test]
    fn add_end_to_end() {
        let add = BoundFunction::new("add", |a: i32, b: i32| a + b);
        assert_eq!(call(&add, &[2.into(), 3.into()]).unwrap(), HostValue::Number(5.0));

        let err = call(&add, &[2.into()]).unwrap_err();
        assert!(matches!(err, CallError::Bind(BindError::Arity { got: 1, .. })));

        let err = call(&add, &["x".into(), 3.into()]).unwrap_err();
        assert!(matches!(err, CallError::Bind(BindError::TypeMismatch { index: 0, .. })));
    }

    #[test]
    fn declared_defaults_accept_range() {
        let f = BoundFunction::new("f", |a: i32, b: i32| a * 10 + b)
            .with_defaults((Some(1), Some(2)))
            .unwrap();
        assert_eq!(f.required_arity(), 0);
        assert_eq!(call(&f, &[]).unwrap(), HostValue::Number(12.0));
        assert_eq!(call(&f, &[5.into()]).unwrap(), HostValue::Number(52.0));
        assert_eq!(call(&f, &[5.into(), 6.into()]).unwrap(), HostValue::Number(56.0));

        let err = call(&f, &[1.into(), 2.into(), 3.into()]).unwrap_err();
        assert!(matches!(
            err,
            CallError::Bind(BindError::Arity {
                min: 0,
                max: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn call_site_defaults_are_exact() {
        let f = BoundFunction::new("f", |a: i32, b: i32| a - b);
        let ctx_args = [HostValue::from(9)];
        let ctx = CallContext::new(&ctx_args);
        assert_eq!(
            f.invoke_with_defaults(&ctx, &(None, Some(4))).unwrap(),
            HostValue::Number(5.0)
        );
        assert!(f.invoke_with_defaults(&ctx, &(None, None)).is_err());
    }

    #[test]
    fn invalid_defaults_rejected_at_bind_time() {
        let err = BoundFunction::new("f", |a: i32, b: i32| a + b)
            .with_defaults((Some(1), None))
            .unwrap_err();
        assert_eq!(err, BindError::InvalidDefaults);
    }

    #[test]
    fn native_errors_propagate() {
        let f = BoundFunction::new("parse", |s: String| s.parse::<i32>().map_err(|e| e.to_string()));
        assert_eq!(call(&f, &["12".into()]).unwrap(), HostValue::Number(12.0));
        let err = call(&f, &["twelve".into()]).unwrap_err();
        assert!(matches!(err, CallError::Native(NativeError::Failed { .. })));
    }

    #[test]
    fn shared_receiver_method() {
        let account = Arc::new(Account { balance: 7 });
        let f = BoundFunction::method("balance", account, Account::balance);
        assert_eq!(call(&f, &[]).unwrap(), 7i64.into_host());
    }

    #[test]
    fn exclusive_receiver_method() {
        let account = Arc::new(Mutex::new(Account { balance: 0 }));
        let f = BoundFunction::method_mut("deposit", account.clone(), Account::deposit);
        call(&f, &[5.into()]).unwrap();
        call(&f, &[6.into()]).unwrap();
        assert_eq!(account.lock().balance, 11);
    }

    #[test]
    fn consuming_receiver_method() {
        let f = BoundFunction::method_once("close", Account { balance: 3 }, Account::close);
        assert_eq!(call(&f, &[]).unwrap(), HostValue::from("closed with 3"));
        let err = call(&f, &[]).unwrap_err();
        assert!(matches!(err, CallError::Native(NativeError::ReceiverConsumed { .. })));
    }

    #[test]
    fn closure_captures_by_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let f = BoundFunction::new("tick", move || counter.fetch_add(1, Ordering::SeqCst) as u32);
        call(&f, &[]).unwrap();
        call(&f, &[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn host_function_raises_type_error() {
        let f = BoundFunction::new("add", |a: i32, b: i32| a + b).to_host_function();
        assert_eq!(f.call(&[1.into(), 2.into()]).unwrap(), HostValue::Number(3.0));

        let err = f.call(&[1.into()]).unwrap_err();
        assert_eq!(err.kind, HostErrorKind::TypeError);
        assert_eq!(err.message, "Wrong number of arguments");

        let err = f.call(&[1.into(), "b".into()]).unwrap_err();
        assert_eq!(err.message, "Type of arg1 is mismatched");
    }

    #[test]
    fn typed_call_helpers() {
        fn mul(a: f64, b: f64) -> f64 {
            a * b
        }
        let args = [HostValue::from(1.5), HostValue::from(4)];
        let ctx = CallContext::new(&args);
        assert_eq!(typed_call(&ctx, &mul).unwrap(), HostValue::Number(6.0));

        let one = [HostValue::from(3)];
        let ctx = CallContext::new(&one);
        assert_eq!(
            typed_call_with_defaults(&ctx, &mul, &(None, Some(2.0))).unwrap(),
            HostValue::Number(6.0)
        );
    }

    #[test]
    fn debug_lists_parameters() {
        let f = BoundFunction::new("g", |_a: bool, _b: String| {});
        let text = format!("{f:?}");
        assert!(text.contains("bool"));
        assert!(text.contains("string"));
    }
}
