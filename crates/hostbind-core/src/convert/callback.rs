//! Typed view over a host function.

use std::fmt;
use std::marker::PhantomData;

use super::{FromHost, IntoHost, IntoHostArgs};
use crate::error::{ConversionError, NativeError};
use crate::host::{HostFunction, HostKinds, HostValue};

/// A host function called with native arguments and a native result.
///
/// Only callable on the function's home thread. Worker threads must take a
/// cross-thread channel parameter instead; calling a `Callback` elsewhere
/// fails with [`NativeError::ThreadAffinity`].
pub struct Callback<Args, R> {
    function: HostFunction,
    _signature: PhantomData<fn(Args) -> R>,
}

impl<Args, R> Callback<Args, R> {
    pub fn new(function: HostFunction) -> Self {
        Self {
            function,
            _signature: PhantomData,
        }
    }

    pub fn function(&self) -> &HostFunction {
        &self.function
    }

    pub fn into_function(self) -> HostFunction {
        self.function
    }
}

impl<Args: IntoHostArgs, R: FromHost> Callback<Args, R> {
    /// Call the host function.
    pub fn call(&self, args: Args) -> Result<R, NativeError> {
        if !self.function.is_home_thread() {
            return Err(NativeError::ThreadAffinity {
                function: self.function.name().to_string(),
            });
        }
        let result = self.function.call(&args.into_host_args())?;
        Ok(R::from_host(&result)?)
    }
}

impl<Args, R> Clone for Callback<Args, R> {
    fn clone(&self) -> Self {
        Self::new(self.function.clone())
    }
}

impl<Args, R> fmt::Debug for Callback<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.function.name()).finish()
    }
}

impl<Args, R> FromHost for Callback<Args, R> {
    const TYPE_NAME: &'static str = "function";
    const ACCEPTS: HostKinds = HostKinds::FUNCTION;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_function()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        HostFunction::from_host(value).map(Callback::new)
    }
}

impl<Args, R> IntoHost for Callback<Args, R> {
    fn into_host(self) -> HostValue {
        HostValue::Function(self.function)
    }
}
