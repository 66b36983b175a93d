//! Pass-through entries for host-native handles.

use super::{FromHost, IntoHost};
use crate::error::ConversionError;
use crate::host::{HostFunction, HostKinds, HostObject, HostValue, Promise};

/// Raw host values pass through untouched.
impl FromHost for HostValue {
    const TYPE_NAME: &'static str = "any";
    const ACCEPTS: HostKinds = HostKinds::ANY;

    fn is_convertible(_value: &HostValue) -> bool {
        true
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoHost for HostValue {
    fn into_host(self) -> HostValue {
        self
    }
}

impl FromHost for HostObject {
    const TYPE_NAME: &'static str = "object";
    const ACCEPTS: HostKinds = HostKinds::OBJECT;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_object()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| ConversionError::mismatch("object", value.kind_name()))
    }
}

impl IntoHost for HostObject {
    fn into_host(self) -> HostValue {
        HostValue::Object(self)
    }
}

impl FromHost for HostFunction {
    const TYPE_NAME: &'static str = "function";
    const ACCEPTS: HostKinds = HostKinds::FUNCTION;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_function()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        value
            .as_function()
            .cloned()
            .ok_or_else(|| ConversionError::mismatch("function", value.kind_name()))
    }
}

impl IntoHost for HostFunction {
    fn into_host(self) -> HostValue {
        HostValue::Function(self)
    }
}

impl FromHost for Promise {
    const TYPE_NAME: &'static str = "promise";
    const ACCEPTS: HostKinds = HostKinds::PROMISE;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_promise()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        value
            .as_promise()
            .cloned()
            .ok_or_else(|| ConversionError::mismatch("promise", value.kind_name()))
    }
}

impl IntoHost for Promise {
    fn into_host(self) -> HostValue {
        HostValue::Promise(self)
    }
}
