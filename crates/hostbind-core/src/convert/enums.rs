//! Enum conversion through the underlying primitive.
//!
//! Enums derive `num_enum::TryFromPrimitive` and `num_enum::IntoPrimitive`
//! and are registered with [`host_enum!`](crate::host_enum):
//!
//! ```
//! use hostbind_core::{host_enum, FromHost, HostValue, IntoHost};
//! use num_enum::{IntoPrimitive, TryFromPrimitive};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, IntoPrimitive, TryFromPrimitive)]
//! #[repr(u8)]
//! enum Mode {
//!     Read = 1,
//!     Write = 2,
//! }
//!
//! host_enum!(Mode);
//!
//! assert_eq!(Mode::Write.into_host(), HostValue::Number(2.0));
//! assert_eq!(Mode::from_host(&HostValue::Number(1.0)).unwrap(), Mode::Read);
//! assert!(!Mode::is_convertible(&HostValue::Number(3.0)));
//! ```

use num_enum::TryFromPrimitive;

use super::{FromHost, IntoHost};
use crate::error::ConversionError;
use crate::host::HostValue;

/// Convert a host value to an enum via its primitive representation.
pub fn enum_from_host<E>(value: &HostValue) -> Result<E, ConversionError>
where
    E: TryFromPrimitive,
    E::Primitive: FromHost,
{
    let raw = <E::Primitive as FromHost>::from_host(value)?;
    E::try_from_primitive(raw).map_err(|_| ConversionError::InvalidEnumValue {
        value: format!("{raw:?}"),
        target_type: std::any::type_name::<E>(),
    })
}

/// Convert an enum to a host value via its primitive representation.
pub fn enum_into_host<E>(value: E) -> HostValue
where
    E: TryFromPrimitive,
    E::Primitive: From<E> + IntoHost,
{
    E::Primitive::from(value).into_host()
}

/// Register enums as host-convertible through their primitive type.
///
/// Each enum must derive `num_enum::TryFromPrimitive` and
/// `num_enum::IntoPrimitive`.
#[macro_export]
macro_rules! host_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::FromHost for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);
                const ACCEPTS: $crate::HostKinds =
                    <<$ty as $crate::__private::TryFromPrimitive>::Primitive as $crate::FromHost>::ACCEPTS;

                fn is_convertible(value: &$crate::HostValue) -> bool {
                    $crate::convert::enum_from_host::<$ty>(value).is_ok()
                }

                fn from_host(value: &$crate::HostValue) -> Result<Self, $crate::ConversionError> {
                    $crate::convert::enum_from_host::<$ty>(value)
                }
            }

            impl $crate::IntoHost for $ty {
                fn into_host(self) -> $crate::HostValue {
                    $crate::convert::enum_into_host::<$ty>(self)
                }
            }
        )+
    };
}
