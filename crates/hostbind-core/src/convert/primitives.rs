//! Primitive conversion entries.

use super::{FromHost, IntoHost};
use crate::error::ConversionError;
use crate::host::{HostKinds, HostValue};

// 2^63 and 2^64 are exact doubles; the ranges below are half-open on them.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0
}

fn check_number(
    n: f64,
    fits: impl Fn(f64) -> bool,
    target_type: &'static str,
) -> Result<f64, ConversionError> {
    if !integral(n) {
        return Err(ConversionError::NotIntegral {
            value: n,
            target_type,
        });
    }
    if !fits(n) {
        return Err(ConversionError::IntegerOverflow {
            value: n.to_string(),
            target_type,
        });
    }
    Ok(n)
}

// ============================================================================
// 32-bit and narrower integers
// ============================================================================

macro_rules! impl_host_int {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromHost for $ty {
                const TYPE_NAME: &'static str = $name;
                const ACCEPTS: HostKinds = HostKinds::NUMBER;

                fn is_convertible(value: &HostValue) -> bool {
                    match value {
                        HostValue::Number(n) => {
                            integral(*n) && *n >= <$ty>::MIN as f64 && *n <= <$ty>::MAX as f64
                        }
                        _ => false,
                    }
                }

                fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
                    match value {
                        HostValue::Number(n) => {
                            let n = check_number(
                                *n,
                                |n| n >= <$ty>::MIN as f64 && n <= <$ty>::MAX as f64,
                                $name,
                            )?;
                            Ok(n as $ty)
                        }
                        other => Err(ConversionError::mismatch($name, other.kind_name())),
                    }
                }
            }

            impl IntoHost for $ty {
                fn into_host(self) -> HostValue {
                    HostValue::Number(f64::from(self))
                }
            }
        )*
    };
}

impl_host_int!(
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
);

// ============================================================================
// 64-bit integers
// ============================================================================

// Both representations are accepted on input. Output uses BigInt only when the
// `bigint` feature is enabled.
macro_rules! impl_host_int64 {
    ($($ty:ty => $name:literal, $lo:expr, $hi:expr);* $(;)?) => {
        $(
            impl FromHost for $ty {
                const TYPE_NAME: &'static str = $name;
                const ACCEPTS: HostKinds = HostKinds::NUMERIC;

                fn is_convertible(value: &HostValue) -> bool {
                    match value {
                        HostValue::Number(n) => integral(*n) && *n >= $lo && *n < $hi,
                        HostValue::BigInt(n) => <$ty>::try_from(*n).is_ok(),
                        _ => false,
                    }
                }

                fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
                    match value {
                        HostValue::Number(n) => {
                            let n = check_number(*n, |n| n >= $lo && n < $hi, $name)?;
                            Ok(n as $ty)
                        }
                        HostValue::BigInt(n) => {
                            <$ty>::try_from(*n).map_err(|_| ConversionError::IntegerOverflow {
                                value: n.to_string(),
                                target_type: $name,
                            })
                        }
                        other => Err(ConversionError::mismatch($name, other.kind_name())),
                    }
                }
            }

            impl IntoHost for $ty {
                #[cfg(feature = "bigint")]
                fn into_host(self) -> HostValue {
                    HostValue::BigInt(i128::from(self))
                }

                #[cfg(not(feature = "bigint"))]
                fn into_host(self) -> HostValue {
                    HostValue::Number(self as f64)
                }
            }
        )*
    };
}

impl_host_int64!(
    i64 => "int64", -TWO_POW_63, TWO_POW_63;
    u64 => "uint64", 0.0, TWO_POW_64;
);

// ============================================================================
// Floats
// ============================================================================

impl FromHost for f64 {
    const TYPE_NAME: &'static str = "double";
    const ACCEPTS: HostKinds = HostKinds::NUMBER;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_number()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        value
            .as_number()
            .ok_or_else(|| ConversionError::mismatch("double", value.kind_name()))
    }
}

impl IntoHost for f64 {
    fn into_host(self) -> HostValue {
        HostValue::Number(self)
    }
}

impl FromHost for f32 {
    const TYPE_NAME: &'static str = "float";
    const ACCEPTS: HostKinds = HostKinds::NUMBER;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_number()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        value
            .as_number()
            .map(|n| n as f32)
            .ok_or_else(|| ConversionError::mismatch("float", value.kind_name()))
    }
}

impl IntoHost for f32 {
    fn into_host(self) -> HostValue {
        HostValue::Number(f64::from(self))
    }
}

// ============================================================================
// Boolean, string, unit
// ============================================================================

impl FromHost for bool {
    const TYPE_NAME: &'static str = "bool";
    const ACCEPTS: HostKinds = HostKinds::BOOLEAN;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_boolean()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        value
            .as_bool()
            .ok_or_else(|| ConversionError::mismatch("bool", value.kind_name()))
    }
}

impl IntoHost for bool {
    fn into_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

impl FromHost for String {
    const TYPE_NAME: &'static str = "string";
    const ACCEPTS: HostKinds = HostKinds::STRING;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_string()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ConversionError::mismatch("string", value.kind_name()))
    }
}

impl IntoHost for String {
    fn into_host(self) -> HostValue {
        HostValue::String(self)
    }
}

impl IntoHost for &str {
    fn into_host(self) -> HostValue {
        HostValue::String(self.to_string())
    }
}

impl IntoHost for char {
    fn into_host(self) -> HostValue {
        HostValue::String(self.to_string())
    }
}

/// `()` accepts any host value and discards it; it converts to `undefined`.
impl FromHost for () {
    const TYPE_NAME: &'static str = "void";
    const ACCEPTS: HostKinds = HostKinds::ANY;

    fn is_convertible(_value: &HostValue) -> bool {
        true
    }

    fn from_host(_value: &HostValue) -> Result<Self, ConversionError> {
        Ok(())
    }
}

impl IntoHost for () {
    fn into_host(self) -> HostValue {
        HostValue::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> HostValue {
        HostValue::Number(n)
    }

    // ========================================================================
    // FromHost tests
    // ========================================================================

    #[test]
    fn from_host_i32() {
        assert_eq!(i32::from_host(&num(42.0)).unwrap(), 42);
        assert_eq!(i32::from_host(&num(-7.0)).unwrap(), -7);
        assert!(i32::is_convertible(&num(2147483647.0)));
        assert!(!i32::is_convertible(&num(2147483648.0)));
    }

    #[test]
    fn from_host_i8_overflow() {
        let err = i8::from_host(&num(200.0)).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::IntegerOverflow {
                target_type: "int8",
                ..
            }
        ));
    }

    #[test]
    fn from_host_u16_rejects_negative() {
        assert!(!u16::is_convertible(&num(-1.0)));
        assert!(u16::from_host(&num(-1.0)).is_err());
        assert!(u16::is_convertible(&num(65535.0)));
    }

    #[test]
    fn from_host_int_rejects_fraction() {
        assert!(!i32::is_convertible(&num(2.5)));
        let err = i32::from_host(&num(2.5)).unwrap_err();
        assert!(matches!(err, ConversionError::NotIntegral { .. }));
    }

    #[test]
    fn from_host_int_rejects_non_finite() {
        assert!(!i32::is_convertible(&num(f64::NAN)));
        assert!(!u32::is_convertible(&num(f64::INFINITY)));
    }

    #[test]
    fn from_host_int_type_mismatch() {
        let err = i32::from_host(&HostValue::from("5")).unwrap_err();
        assert_eq!(err, ConversionError::mismatch("int32", "string"));
    }

    #[test]
    fn from_host_i64_accepts_both_representations() {
        assert_eq!(i64::from_host(&num(-5.0)).unwrap(), -5);
        assert_eq!(i64::from_host(&HostValue::BigInt(i64::MAX as i128)).unwrap(), i64::MAX);
        assert!(!i64::is_convertible(&HostValue::BigInt(i64::MAX as i128 + 1)));
        assert!(!i64::is_convertible(&num(TWO_POW_63)));
    }

    #[test]
    fn from_host_u64_bounds() {
        assert_eq!(u64::from_host(&HostValue::BigInt(u64::MAX as i128)).unwrap(), u64::MAX);
        assert!(!u64::is_convertible(&HostValue::BigInt(-1)));
        assert!(!u64::is_convertible(&num(TWO_POW_64)));
    }

    #[test]
    fn from_host_floats() {
        assert_eq!(f64::from_host(&num(1.25)).unwrap(), 1.25);
        assert_eq!(f32::from_host(&num(1.25)).unwrap(), 1.25f32);
        assert!(!f64::is_convertible(&HostValue::BigInt(1)));
    }

    #[test]
    fn from_host_bool_and_string() {
        assert!(bool::from_host(&HostValue::Bool(true)).unwrap());
        assert!(!bool::is_convertible(&num(1.0)));
        assert_eq!(String::from_host(&"hi".into()).unwrap(), "hi");
        assert!(!String::is_convertible(&num(1.0)));
    }

    #[test]
    fn unit_accepts_anything() {
        assert!(<()>::is_convertible(&HostValue::Null));
        assert!(<()>::from_host(&num(3.0)).is_ok());
    }

    // ========================================================================
    // IntoHost tests
    // ========================================================================

    #[test]
    fn into_host_narrow_ints() {
        assert_eq!(7u8.into_host(), num(7.0));
        assert_eq!((-3i16).into_host(), num(-3.0));
        assert_eq!(u32::MAX.into_host(), num(4294967295.0));
    }

    #[cfg(not(feature = "bigint"))]
    #[test]
    fn into_host_i64_as_number() {
        assert_eq!(5i64.into_host(), num(5.0));
    }

    #[cfg(feature = "bigint")]
    #[test]
    fn into_host_i64_as_bigint() {
        assert_eq!(5i64.into_host(), HostValue::BigInt(5));
        assert_eq!(u64::MAX.into_host(), HostValue::BigInt(u64::MAX as i128));
    }

    #[test]
    fn into_host_misc() {
        assert_eq!(().into_host(), HostValue::Undefined);
        assert_eq!("s".into_host(), HostValue::from("s"));
        assert_eq!('c'.into_host(), HostValue::from("c"));
        assert_eq!(true.into_host(), HostValue::Bool(true));
    }

    // ========================================================================
    // Round trip tests
    // ========================================================================

    #[test]
    fn roundtrip_int_extremes() {
        assert_eq!(i8::from_host(&i8::MIN.into_host()).unwrap(), i8::MIN);
        assert_eq!(u16::from_host(&u16::MAX.into_host()).unwrap(), u16::MAX);
        assert_eq!(i32::from_host(&i32::MIN.into_host()).unwrap(), i32::MIN);
        assert_eq!(u32::from_host(&u32::MAX.into_host()).unwrap(), u32::MAX);
    }

    #[test]
    fn roundtrip_float32() {
        let v = 0.1f32;
        assert_eq!(f32::from_host(&v.into_host()).unwrap(), v);
    }
}
