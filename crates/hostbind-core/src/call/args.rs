//! Binding host arguments to native parameter tuples.
//!
//! [`ArgList`] is implemented for tuples of up to nine [`FromHost`] types.
//! Binding runs in three steps:
//!
//! 1. Arity: the argument count must equal the parameter count minus the
//!    defaults supplied for this call.
//! 2. Check: `is_convertible` runs left to right and stops at the first
//!    mismatch.
//! 3. Convert: required arguments are converted, then the supplied defaults
//!    fill the trailing parameters.
//!
//! Defaults are carried as one `Option` per parameter, so
//! `(None, Some(2))` supplies a default for the second parameter only.

use crate::convert::{FromHost, IntoHost, IntoHostArgs};
use crate::error::BindError;
use crate::host::HostValue;

/// A native parameter list that can be bound from host arguments.
pub trait ArgList: Sized + 'static {
    /// Number of parameters.
    const LEN: usize;

    /// Per-parameter default values, `(Option<A0>, .., Option<An>)`.
    type Defaults: Clone + Default + Send + Sync + 'static;

    /// Parameter type names, in declaration order.
    fn type_names() -> Vec<&'static str>;

    /// Check every supplied argument against its parameter type.
    ///
    /// Stops at the first failure.
    fn check(args: &[HostValue]) -> Result<(), BindError>;

    /// Number of defaults, which must form a trailing run.
    fn default_count(defaults: &Self::Defaults) -> Result<usize, BindError>;

    /// The defaults a call with `supplied` arguments needs from `declared`.
    fn defaults_for(declared: &Self::Defaults, supplied: usize) -> Self::Defaults;

    /// Convert checked arguments and fill the rest from `defaults`.
    fn convert(args: &[HostValue], defaults: &Self::Defaults) -> Result<Self, BindError>;

    /// Validate and convert `args`, using exactly the given defaults.
    fn bind(args: &[HostValue], defaults: &Self::Defaults) -> Result<Self, BindError> {
        let supplied = Self::default_count(defaults)?;
        let required = Self::LEN - supplied;
        if args.len() != required {
            return Err(BindError::Arity {
                min: required,
                max: required,
                got: args.len(),
            });
        }
        Self::check(args)?;
        Self::convert(args, defaults)
    }

    /// Validate and convert `args` against declared trailing defaults.
    ///
    /// Any count between the required parameters and [`LEN`](Self::LEN) is
    /// accepted; a call with M arguments takes the last `LEN - M` defaults.
    fn bind_declared(args: &[HostValue], declared: &Self::Defaults) -> Result<Self, BindError> {
        let got = args.len();
        let min = Self::LEN - Self::default_count(declared)?;
        if got < min || got > Self::LEN {
            return Err(BindError::Arity {
                min,
                max: Self::LEN,
                got,
            });
        }
        Self::bind(args, &Self::defaults_for(declared, got))
    }
}

/// Length of the trailing run of `true`, failing if any `true` precedes it.
fn trailing_run(present: &[bool]) -> Result<usize, BindError> {
    let run = present.iter().rev().take_while(|p| **p).count();
    if present[..present.len() - run].iter().any(|p| *p) {
        return Err(BindError::InvalidDefaults);
    }
    Ok(run)
}

fn take<T: FromHost + Clone>(
    args: &[HostValue],
    index: usize,
    len: usize,
    default: &Option<T>,
) -> Result<T, BindError> {
    match args.get(index) {
        Some(value) => T::from_host(value).map_err(|source| BindError::Conversion { index, source }),
        None => default.clone().ok_or(BindError::Arity {
            min: len,
            max: len,
            got: args.len(),
        }),
    }
}

macro_rules! impl_arg_list {
    ($len:expr; $($ty:ident => $idx:tt),*) => {
        impl<$($ty),*> ArgList for ($($ty,)*)
        where
            $($ty: FromHost + Clone + Send + Sync + 'static,)*
        {
            const LEN: usize = $len;
            type Defaults = ($(Option<$ty>,)*);

            fn type_names() -> Vec<&'static str> {
                vec![$($ty::TYPE_NAME),*]
            }

            #[allow(unused_variables)]
            fn check(args: &[HostValue]) -> Result<(), BindError> {
                $(
                    if let Some(value) = args.get($idx) {
                        if !$ty::is_convertible(value) {
                            return Err(BindError::TypeMismatch {
                                index: $idx,
                                expected: $ty::TYPE_NAME,
                                actual: value.kind_name(),
                            });
                        }
                    }
                )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn default_count(defaults: &Self::Defaults) -> Result<usize, BindError> {
                let present: [bool; $len] = [$(defaults.$idx.is_some()),*];
                trailing_run(&present)
            }

            #[allow(unused_variables, clippy::unused_unit)]
            fn defaults_for(declared: &Self::Defaults, supplied: usize) -> Self::Defaults {
                ($(if $idx >= supplied { declared.$idx.clone() } else { None },)*)
            }

            #[allow(unused_variables, clippy::unused_unit)]
            fn convert(args: &[HostValue], defaults: &Self::Defaults) -> Result<Self, BindError> {
                Ok(($(take::<$ty>(args, $idx, $len, &defaults.$idx)?,)*))
            }
        }

        impl<$($ty),*> IntoHostArgs for ($($ty,)*)
        where
            $($ty: IntoHost,)*
        {
            #[allow(non_snake_case, clippy::unused_unit)]
            fn into_host_args(self) -> Vec<HostValue> {
                let ($($ty,)*) = self;
                vec![$($ty.into_host()),*]
            }
        }
    };
}

impl_arg_list!(0;);
impl_arg_list!(1; A0 => 0);
impl_arg_list!(2; A0 => 0, A1 => 1);
impl_arg_list!(3; A0 => 0, A1 => 1, A2 => 2);
impl_arg_list!(4; A0 => 0, A1 => 1, A2 => 2, A3 => 3);
impl_arg_list!(5; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4);
impl_arg_list!(6; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5);
impl_arg_list!(7; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6);
impl_arg_list!(8; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6, A7 => 7);
impl_arg_list!(9; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6, A7 => 7, A8 => 8);
