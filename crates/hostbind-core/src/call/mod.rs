//! Typed invocation of native callables from host arguments.
//!
//! - [`CallContext`]: the host argument list of one call
//! - [`ArgList`]: arity/type checking and conversion into a native tuple
//! - [`NativeFn`] and friends: callable shapes, expanded per arity
//! - [`BoundFunction`]: a callable plus its parameter list and defaults

mod args;
mod bound;
mod context;
mod native_fn;

pub use args::ArgList;
pub use bound::{BoundFunction, typed_call, typed_call_with_defaults};
pub use context::CallContext;
pub use native_fn::{NativeFn, NativeFnWith, NativeMethod, NativeMethodMut, NativeReturn};
