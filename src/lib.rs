//! Bind statically typed Rust functions to a dynamically typed host runtime.
//!
//! `hostbind` exposes native functions as host callables with automatic
//! argument validation, conversion and default filling, and runs blocking
//! work on worker threads with promise-style completion and cooperative
//! cancellation.
//!
//! # Quick Start
//!
//! ```
//! use hostbind::prelude::*;
//!
//! let runtime = Runtime::new(&RuntimeConfig::default()).unwrap();
//!
//! // Synchronous entry point.
//! let add = BoundFunction::new("Add", |a: i32, b: i32| a + b).into_host();
//! let sum = add.as_function().unwrap().call(&[2.into(), 3.into()]).unwrap();
//! assert_eq!(sum, HostValue::Number(5.0));
//!
//! // Asynchronous entry point.
//! let slow_add = runtime.bridge().function("SlowAdd", |a: i32, b: i32| a + b);
//! let handle = slow_add.call(&CallContext::new(&[2.into(), 3.into()])).unwrap();
//! assert_eq!(runtime.block_on(handle.promise()).unwrap(), Ok(5.into()));
//! ```
//!
//! # Crates
//!
//! - [`hostbind_core`]: value model, conversions, dispatch, variant maps
//! - [`hostbind_runtime`]: host loop, cross-thread channels, async bridge

mod runtime;

pub use hostbind_core::*;
pub use hostbind_core::host_enum;
pub use hostbind_runtime::{
    AsyncBridge, AsyncFunction, AsyncHandle, CancellationToken, Canceller, ChannelError,
    ConfigError, CrossThreadChannel, HostLoop, RuntimeConfig, RuntimeError, RuntimeResult,
    WorkerConfig, WorkerPool, config, logging,
};
pub use runtime::Runtime;

/// Derives for enums converted with [`host_enum!`].
pub use num_enum;

pub mod prelude {
    pub use crate::Runtime;
    pub use hostbind_core::{
        BoundFunction, CallContext, CallError, Callback, FromHost, HostError, HostFunction,
        HostObject, HostValue, IntoHost, NativeError, Promise, Rejection, VariantMap,
        VariantValue,
    };
    pub use hostbind_runtime::{
        AsyncBridge, AsyncFunction, AsyncHandle, CancellationToken, CrossThreadChannel, HostLoop,
        RuntimeConfig,
    };
}
