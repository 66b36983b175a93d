//! Conversion traits between native Rust types and host values.
//!
//! This module provides the per-type conversion entries:
//! - [`FromHost`]: check and extract a Rust value from a [`HostValue`]
//! - [`IntoHost`]: convert a Rust value into a [`HostValue`]
//! - [`IntoHostArgs`]: convert a tuple of Rust values into call arguments
//!
//! Exactly one impl applies to each type, chosen at compile time. There is
//! no fallback entry: using a type without an impl is a compile error.
//!
//! ```compile_fail
//! use hostbind_core::{BoundFunction, HostValue};
//!
//! struct Opaque;
//!
//! // `Opaque` has no `FromHost` impl, so it cannot be a parameter.
//! let f = BoundFunction::new("take", |_o: Opaque| 1i32);
//! ```
//!
//! ## Supported Types
//!
//! - Integers: `i8`..`i64`, `u8`..`u64` (range and integrality checked)
//! - Floats: `f32`, `f64`
//! - `bool`, `String`, `()`
//! - `Vec<T>`, `Option<T>`
//! - Enums via [`host_enum!`](crate::host_enum)
//! - Callables: [`HostFunction`](crate::HostFunction), [`Callback`]
//! - [`HostValue`], [`HostObject`](crate::HostObject), [`Promise`](crate::Promise)

mod callback;
mod enums;
mod handles;
mod primitives;
mod sequence;

pub use callback::Callback;
pub use enums::{enum_from_host, enum_into_host};

use crate::error::ConversionError;
use crate::host::{HostKinds, HostValue};

/// Extract a native value from a host value.
pub trait FromHost: Sized {
    /// Name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Host kinds this type can ever be converted from.
    const ACCEPTS: HostKinds;

    /// Whether `value` converts to `Self` without error.
    ///
    /// Total and side-effect free; used to validate arguments before any
    /// conversion is committed.
    fn is_convertible(value: &HostValue) -> bool;

    /// Convert `value` to `Self`.
    fn from_host(value: &HostValue) -> Result<Self, ConversionError>;
}

/// Convert a native value into a host value.
pub trait IntoHost {
    fn into_host(self) -> HostValue;
}

/// Convert a tuple of native values into host call arguments.
///
/// Implemented for tuples of up to nine [`IntoHost`] elements.
pub trait IntoHostArgs {
    fn into_host_args(self) -> Vec<HostValue>;
}

/// Shorthand for `T::from_host(value)`.
pub fn to_native<T: FromHost>(value: &HostValue) -> Result<T, ConversionError> {
    T::from_host(value)
}

/// Shorthand for `value.into_host()`.
pub fn to_host<T: IntoHost>(value: T) -> HostValue {
    value.into_host()
}
