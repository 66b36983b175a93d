//! The dynamically typed host value.

use std::fmt;

use super::{HostFunction, HostKinds, HostObject, Promise};

/// A value as seen by the host runtime.
///
/// Numbers are IEEE754 doubles; 64-bit integers may also travel as
/// [`HostValue::BigInt`]. Arrays and objects have value semantics, while
/// functions and promises are reference-shared handles.
#[derive(Clone, Default)]
pub enum HostValue {
    /// Absent value (`undefined`)
    #[default]
    Undefined,
    /// Explicit `null`
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    Array(Vec<HostValue>),
    Object(HostObject),
    Function(HostFunction),
    Promise(Promise),
}

impl HostValue {
    /// The kind of this value as a single-bit mask.
    pub fn kind(&self) -> HostKinds {
        match self {
            HostValue::Undefined => HostKinds::UNDEFINED,
            HostValue::Null => HostKinds::NULL,
            HostValue::Bool(_) => HostKinds::BOOLEAN,
            HostValue::Number(_) => HostKinds::NUMBER,
            HostValue::BigInt(_) => HostKinds::BIGINT,
            HostValue::String(_) => HostKinds::STRING,
            HostValue::Array(_) => HostKinds::ARRAY,
            HostValue::Object(_) => HostKinds::OBJECT,
            HostValue::Function(_) => HostKinds::FUNCTION,
            HostValue::Promise(_) => HostKinds::PROMISE,
        }
    }

    /// Kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, HostValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, HostValue::Undefined | HostValue::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, HostValue::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, HostValue::Number(_))
    }

    pub fn is_bigint(&self) -> bool {
        matches!(self, HostValue::BigInt(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, HostValue::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, HostValue::Array(_))
    }

    /// Plain objects only; functions, arrays and promises are excluded.
    pub fn is_object(&self) -> bool {
        matches!(self, HostValue::Object(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, HostValue::Function(_))
    }

    pub fn is_promise(&self) -> bool {
        matches!(self, HostValue::Promise(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<i128> {
        match self {
            HostValue::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&HostFunction> {
        match self {
            HostValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_promise(&self) -> Option<&Promise> {
        match self {
            HostValue::Promise(p) => Some(p),
            _ => None,
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) => true,
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Number(a), HostValue::Number(b)) => a == b,
            (HostValue::BigInt(a), HostValue::BigInt(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a == b,
            // Handles compare by identity
            (HostValue::Function(a), HostValue::Function(b)) => a.ptr_eq(b),
            (HostValue::Promise(a), HostValue::Promise(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "undefined"),
            HostValue::Null => write!(f, "null"),
            HostValue::Bool(b) => write!(f, "{b}"),
            HostValue::Number(n) => write!(f, "{n}"),
            HostValue::BigInt(n) => write!(f, "{n}n"),
            HostValue::String(s) => write!(f, "{s:?}"),
            HostValue::Array(items) => f.debug_list().entries(items).finish(),
            HostValue::Object(obj) => fmt::Debug::fmt(obj, f),
            HostValue::Function(func) => write!(f, "[Function: {}]", func.name()),
            HostValue::Promise(p) => fmt::Debug::fmt(p, f),
        }
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Number(f64::from(value))
    }
}

impl From<u32> for HostValue {
    fn from(value: u32) -> Self {
        HostValue::Number(f64::from(value))
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::String(value)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(value: Vec<HostValue>) -> Self {
        HostValue::Array(value)
    }
}

impl From<HostObject> for HostValue {
    fn from(value: HostObject) -> Self {
        HostValue::Object(value)
    }
}

impl From<HostFunction> for HostValue {
    fn from(value: HostFunction) -> Self {
        HostValue::Function(value)
    }
}

impl From<Promise> for HostValue {
    fn from(value: Promise) -> Self {
        HostValue::Promise(value)
    }
}
