//! Sequences and optional values.

use super::{FromHost, IntoHost};
use crate::error::ConversionError;
use crate::host::{HostKinds, HostValue};

/// Arrays convert element-wise; every element must be convertible.
impl<T: FromHost> FromHost for Vec<T> {
    const TYPE_NAME: &'static str = "array";
    const ACCEPTS: HostKinds = HostKinds::ARRAY;

    fn is_convertible(value: &HostValue) -> bool {
        match value {
            HostValue::Array(items) => items.iter().all(T::is_convertible),
            _ => false,
        }
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| T::from_host(item).map_err(|e| e.in_element(index)))
                .collect(),
            other => Err(ConversionError::mismatch("array", other.kind_name())),
        }
    }
}

impl<T: IntoHost> IntoHost for Vec<T> {
    fn into_host(self) -> HostValue {
        HostValue::Array(self.into_iter().map(IntoHost::into_host).collect())
    }
}

/// `null` and `undefined` map to `None`.
impl<T: FromHost> FromHost for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;
    const ACCEPTS: HostKinds = T::ACCEPTS.union(HostKinds::NULLISH);

    fn is_convertible(value: &HostValue) -> bool {
        value.is_nullish() || T::is_convertible(value)
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        if value.is_nullish() {
            Ok(None)
        } else {
            T::from_host(value).map(Some)
        }
    }
}

impl<T: IntoHost> IntoHost for Option<T> {
    fn into_host(self) -> HostValue {
        match self {
            Some(v) => v.into_host(),
            None => HostValue::Null,
        }
    }
}
