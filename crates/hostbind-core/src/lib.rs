//! Core types for binding native Rust functions to a host scripting runtime.
//!
//! - [`host`]: the host value model, functions, promises and env access
//! - [`convert`]: per-type conversion entries between native and host values
//! - [`call`]: arity checking, defaults and typed dispatch of native callables
//! - [`variant`]: a dynamic string-keyed container of classified values
//! - [`error`]: the error taxonomy shared by all of the above
//!
//! # Example
//!
//! ```
//! use hostbind_core::{BoundFunction, CallContext, HostValue};
//!
//! let add = BoundFunction::new("Add", |a: i32, b: i32| a + b)
//!     .with_defaults((None, Some(10)))
//!     .unwrap();
//!
//! let both = [HostValue::from(2), HostValue::from(3)];
//! assert_eq!(add.invoke(&CallContext::new(&both)).unwrap(), HostValue::Number(5.0));
//! let one = [HostValue::from(2)];
//! assert_eq!(add.invoke(&CallContext::new(&one)).unwrap(), HostValue::Number(12.0));
//! ```

pub mod call;
pub mod convert;
pub mod error;
pub mod host;
pub mod variant;

pub use call::{
    ArgList, BoundFunction, CallContext, NativeFn, NativeFnWith, NativeMethod, NativeMethodMut,
    NativeReturn, typed_call, typed_call_with_defaults,
};
pub use convert::{Callback, FromHost, IntoHost, IntoHostArgs};
pub use error::{
    BindError, CallError, ConversionError, HostError, HostErrorKind, HostResult, NativeError,
};
pub use host::{
    Deferred, EnvGuard, HostEnv, HostFunction, HostKinds, HostObject, HostScheduler, HostTask,
    HostValue, Promise, PromiseState, RejectStatus, Rejection, SchedulerClosed, Settlement,
};
pub use variant::{CLASSIFICATION_ORDER, VariantKind, VariantMap, VariantValue};

#[doc(hidden)]
pub mod __private {
    pub use num_enum::TryFromPrimitive;
}
