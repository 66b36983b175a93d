//! Native callable shapes, expanded per arity.
//!
//! Each trait is implemented for every `Fn` of matching shape with zero to
//! nine parameters. The parameter tuple is a type parameter of the trait, so
//! the arity is resolved statically from the function's signature:
//!
//! | Trait | Shape |
//! |---|---|
//! | [`NativeFn<Args>`] | `Fn(A0, .., An) -> R` |
//! | [`NativeMethod<T, Args>`] | `Fn(&T, A0, .., An) -> R` |
//! | [`NativeMethodMut<T, Args>`] | `Fn(&mut T, A0, .., An) -> R` |
//! | [`NativeFnWith<L, Args>`] | `Fn(L, A0, .., An) -> R`, `L` supplied by the binding |
//!
//! `R` implements [`NativeReturn`]: any [`IntoHost`] type, or a `Result`
//! whose error converts into [`NativeError`].

use crate::convert::IntoHost;
use crate::error::NativeError;

/// Return types of native callables.
pub trait NativeReturn {
    /// The successful value.
    type Value: IntoHost;

    fn into_native_result(self) -> Result<Self::Value, NativeError>;
}

impl<T: IntoHost> NativeReturn for T {
    type Value = T;

    fn into_native_result(self) -> Result<T, NativeError> {
        Ok(self)
    }
}

impl<T: IntoHost, E: Into<NativeError>> NativeReturn for Result<T, E> {
    type Value = T;

    fn into_native_result(self) -> Result<T, NativeError> {
        self.map_err(Into::into)
    }
}

/// A free function or closure taking the parameter tuple `Args`.
pub trait NativeFn<Args>: Send + Sync + 'static {
    type Output: NativeReturn;

    fn invoke(&self, args: Args) -> Self::Output;
}

/// A method taking its receiver by shared reference.
pub trait NativeMethod<T: ?Sized, Args>: Send + Sync + 'static {
    type Output: NativeReturn;

    fn invoke(&self, receiver: &T, args: Args) -> Self::Output;
}

/// A method taking its receiver by exclusive reference.
pub trait NativeMethodMut<T: ?Sized, Args>: Send + Sync + 'static {
    type Output: NativeReturn;

    fn invoke(&self, receiver: &mut T, args: Args) -> Self::Output;
}

/// A callable whose first parameter is supplied by the binding, not the host.
///
/// Used for by-value receivers and for cancellation tokens.
pub trait NativeFnWith<L, Args>: Send + Sync + 'static {
    type Output: NativeReturn;

    fn invoke(&self, lead: L, args: Args) -> Self::Output;
}

macro_rules! impl_native_fn {
    ($($ty:ident),*) => {
        impl<Func, Ret, $($ty),*> NativeFn<($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) -> Ret + Send + Sync + 'static,
            Ret: NativeReturn,
        {
            type Output = Ret;

            #[allow(non_snake_case, clippy::unused_unit)]
            fn invoke(&self, args: ($($ty,)*)) -> Ret {
                let ($($ty,)*) = args;
                (self)($($ty),*)
            }
        }

        impl<Func, Recv, Ret, $($ty),*> NativeMethod<Recv, ($($ty,)*)> for Func
        where
            Func: Fn(&Recv, $($ty),*) -> Ret + Send + Sync + 'static,
            Recv: ?Sized,
            Ret: NativeReturn,
        {
            type Output = Ret;

            #[allow(non_snake_case, clippy::unused_unit)]
            fn invoke(&self, receiver: &Recv, args: ($($ty,)*)) -> Ret {
                let ($($ty,)*) = args;
                (self)(receiver, $($ty),*)
            }
        }

        impl<Func, Recv, Ret, $($ty),*> NativeMethodMut<Recv, ($($ty,)*)> for Func
        where
            Func: Fn(&mut Recv, $($ty),*) -> Ret + Send + Sync + 'static,
            Recv: ?Sized,
            Ret: NativeReturn,
        {
            type Output = Ret;

            #[allow(non_snake_case, clippy::unused_unit)]
            fn invoke(&self, receiver: &mut Recv, args: ($($ty,)*)) -> Ret {
                let ($($ty,)*) = args;
                (self)(receiver, $($ty),*)
            }
        }

        impl<Func, Lead, Ret, $($ty),*> NativeFnWith<Lead, ($($ty,)*)> for Func
        where
            Func: Fn(Lead, $($ty),*) -> Ret + Send + Sync + 'static,
            Ret: NativeReturn,
        {
            type Output = Ret;

            #[allow(non_snake_case, clippy::unused_unit)]
            fn invoke(&self, lead: Lead, args: ($($ty,)*)) -> Ret {
                let ($($ty,)*) = args;
                (self)(lead, $($ty),*)
            }
        }
    };
}

impl_native_fn!();
impl_native_fn!(A0);
impl_native_fn!(A0, A1);
impl_native_fn!(A0, A1, A2);
impl_native_fn!(A0, A1, A2, A3);
impl_native_fn!(A0, A1, A2, A3, A4);
impl_native_fn!(A0, A1, A2, A3, A4, A5);
impl_native_fn!(A0, A1, A2, A3, A4, A5, A6);
impl_native_fn!(A0, A1, A2, A3, A4, A5, A6, A7);
impl_native_fn!(A0, A1, A2, A3, A4, A5, A6, A7, A8);
