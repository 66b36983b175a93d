//! Dynamic string-keyed container of heterogeneous values.
//!
//! [`VariantMap`] converts to and from plain host objects. Each property is
//! classified by trying the kinds of [`CLASSIFICATION_ORDER`] in order and
//! taking the first whose conversion entry accepts the value. Arrays are
//! checked before scalars: an array whose elements all satisfy one kind
//! becomes a list tagged with that kind, otherwise every element is
//! classified on its own.
//!
//! Values that satisfy several kinds resolve to the first one. For example
//! the number `1` always becomes [`VariantValue::Int16`], and `2.0` is an
//! integer rather than a [`VariantValue::Float64`].

use std::fmt;

use rustc_hash::FxHashMap;

use crate::convert::{FromHost, IntoHost};
use crate::error::ConversionError;
use crate::host::{HostFunction, HostKinds, HostObject, HostValue};

/// A classifiable kind of variant value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    String,
    Bool,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float64,
    Callable,
    Map,
}

/// Fixed priority in which kinds are tried during classification.
pub const CLASSIFICATION_ORDER: [VariantKind; 11] = [
    VariantKind::String,
    VariantKind::Bool,
    VariantKind::Int16,
    VariantKind::UInt16,
    VariantKind::Int32,
    VariantKind::UInt32,
    VariantKind::Int64,
    VariantKind::UInt64,
    VariantKind::Float64,
    VariantKind::Callable,
    VariantKind::Map,
];

impl VariantKind {
    pub fn name(self) -> &'static str {
        match self {
            VariantKind::String => String::TYPE_NAME,
            VariantKind::Bool => bool::TYPE_NAME,
            VariantKind::Int16 => i16::TYPE_NAME,
            VariantKind::UInt16 => u16::TYPE_NAME,
            VariantKind::Int32 => i32::TYPE_NAME,
            VariantKind::UInt32 => u32::TYPE_NAME,
            VariantKind::Int64 => i64::TYPE_NAME,
            VariantKind::UInt64 => u64::TYPE_NAME,
            VariantKind::Float64 => f64::TYPE_NAME,
            VariantKind::Callable => HostFunction::TYPE_NAME,
            VariantKind::Map => VariantMap::TYPE_NAME,
        }
    }

    fn accepted_kinds(self) -> HostKinds {
        match self {
            VariantKind::String => String::ACCEPTS,
            VariantKind::Bool => bool::ACCEPTS,
            VariantKind::Int16 => i16::ACCEPTS,
            VariantKind::UInt16 => u16::ACCEPTS,
            VariantKind::Int32 => i32::ACCEPTS,
            VariantKind::UInt32 => u32::ACCEPTS,
            VariantKind::Int64 => i64::ACCEPTS,
            VariantKind::UInt64 => u64::ACCEPTS,
            VariantKind::Float64 => f64::ACCEPTS,
            VariantKind::Callable => HostFunction::ACCEPTS,
            VariantKind::Map => VariantMap::ACCEPTS,
        }
    }

    /// Whether this kind's conversion entry accepts `value`.
    pub fn accepts(self, value: &HostValue) -> bool {
        if !self.accepted_kinds().contains(value.kind()) {
            return false;
        }
        match self {
            VariantKind::String => String::is_convertible(value),
            VariantKind::Bool => bool::is_convertible(value),
            VariantKind::Int16 => i16::is_convertible(value),
            VariantKind::UInt16 => u16::is_convertible(value),
            VariantKind::Int32 => i32::is_convertible(value),
            VariantKind::UInt32 => u32::is_convertible(value),
            VariantKind::Int64 => i64::is_convertible(value),
            VariantKind::UInt64 => u64::is_convertible(value),
            VariantKind::Float64 => f64::is_convertible(value),
            VariantKind::Callable => HostFunction::is_convertible(value),
            VariantKind::Map => VariantMap::is_convertible(value),
        }
    }

    fn convert(self, value: &HostValue) -> Result<VariantValue, ConversionError> {
        Ok(match self {
            VariantKind::String => VariantValue::String(String::from_host(value)?),
            VariantKind::Bool => VariantValue::Bool(bool::from_host(value)?),
            VariantKind::Int16 => VariantValue::Int16(i16::from_host(value)?),
            VariantKind::UInt16 => VariantValue::UInt16(u16::from_host(value)?),
            VariantKind::Int32 => VariantValue::Int32(i32::from_host(value)?),
            VariantKind::UInt32 => VariantValue::UInt32(u32::from_host(value)?),
            VariantKind::Int64 => VariantValue::Int64(i64::from_host(value)?),
            VariantKind::UInt64 => VariantValue::UInt64(u64::from_host(value)?),
            VariantKind::Float64 => VariantValue::Float64(f64::from_host(value)?),
            VariantKind::Callable => VariantValue::Callable(HostFunction::from_host(value)?),
            VariantKind::Map => VariantValue::Map(VariantMap::from_host(value)?),
        })
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single value held by a [`VariantMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum VariantValue {
    Null,
    /// Absent or unrecognised value
    Undefined,
    Bool(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(String),
    List(Vec<VariantValue>),
    Callable(HostFunction),
    Map(VariantMap),
}

impl VariantValue {
    /// Classify a host value.
    ///
    /// Never fails: values no kind accepts become [`VariantValue::Undefined`].
    pub fn classify(value: &HostValue) -> VariantValue {
        match value {
            HostValue::Null => VariantValue::Null,
            HostValue::Undefined => VariantValue::Undefined,
            HostValue::Array(items) => classify_array(items),
            _ => CLASSIFICATION_ORDER
                .iter()
                .find(|kind| kind.accepts(value))
                .and_then(|kind| kind.convert(value).ok())
                .unwrap_or(VariantValue::Undefined),
        }
    }

    /// The scalar kind of this value, if it has one.
    pub fn kind(&self) -> Option<VariantKind> {
        match self {
            VariantValue::String(_) => Some(VariantKind::String),
            VariantValue::Bool(_) => Some(VariantKind::Bool),
            VariantValue::Int16(_) => Some(VariantKind::Int16),
            VariantValue::UInt16(_) => Some(VariantKind::UInt16),
            VariantValue::Int32(_) => Some(VariantKind::Int32),
            VariantValue::UInt32(_) => Some(VariantKind::UInt32),
            VariantValue::Int64(_) => Some(VariantKind::Int64),
            VariantValue::UInt64(_) => Some(VariantKind::UInt64),
            VariantValue::Float64(_) => Some(VariantKind::Float64),
            VariantValue::Callable(_) => Some(VariantKind::Callable),
            VariantValue::Map(_) => Some(VariantKind::Map),
            VariantValue::Null | VariantValue::Undefined | VariantValue::List(_) => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, VariantValue::Undefined)
    }
}

fn classify_array(items: &[HostValue]) -> VariantValue {
    if !items.is_empty() {
        for kind in CLASSIFICATION_ORDER {
            if items.iter().all(|item| kind.accepts(item)) {
                let typed: Result<Vec<_>, _> = items.iter().map(|item| kind.convert(item)).collect();
                if let Ok(list) = typed {
                    return VariantValue::List(list);
                }
            }
        }
    }
    VariantValue::List(items.iter().map(VariantValue::classify).collect())
}

impl FromHost for VariantValue {
    const TYPE_NAME: &'static str = "variant";
    const ACCEPTS: HostKinds = HostKinds::ANY;

    fn is_convertible(_value: &HostValue) -> bool {
        true
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        Ok(VariantValue::classify(value))
    }
}

impl IntoHost for VariantValue {
    fn into_host(self) -> HostValue {
        match self {
            VariantValue::Null => HostValue::Null,
            VariantValue::Undefined => HostValue::Undefined,
            VariantValue::Bool(v) => v.into_host(),
            VariantValue::Int16(v) => v.into_host(),
            VariantValue::UInt16(v) => v.into_host(),
            VariantValue::Int32(v) => v.into_host(),
            VariantValue::UInt32(v) => v.into_host(),
            VariantValue::Int64(v) => v.into_host(),
            VariantValue::UInt64(v) => v.into_host(),
            VariantValue::Float64(v) => v.into_host(),
            VariantValue::String(v) => v.into_host(),
            VariantValue::List(items) => items.into_host(),
            VariantValue::Callable(f) => f.into_host(),
            VariantValue::Map(map) => map.into_host(),
        }
    }
}

macro_rules! impl_variant_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for VariantValue {
                fn from(value: $ty) -> Self {
                    VariantValue::$variant(value)
                }
            }
        )*
    };
}

impl_variant_from!(
    bool => Bool,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f64 => Float64,
    String => String,
    Vec<VariantValue> => List,
    HostFunction => Callable,
    VariantMap => Map,
);

impl From<&str> for VariantValue {
    fn from(value: &str) -> Self {
        VariantValue::String(value.to_string())
    }
}

/// String-keyed map of [`VariantValue`]s with value semantics.
///
/// Copy it, rather than share it, when handing it to another thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantMap {
    entries: FxHashMap<String, VariantValue>,
}

impl VariantMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<VariantValue>) -> Option<VariantValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&VariantValue> {
        self.entries.get(key)
    }

    /// Read an entry as a native type through its conversion entry.
    ///
    /// A missing key reads as `undefined`.
    pub fn get_as<T: FromHost>(&self, key: &str) -> Result<T, ConversionError> {
        let host = self
            .entries
            .get(key)
            .cloned()
            .map(IntoHost::into_host)
            .unwrap_or_default();
        if !T::is_convertible(&host) {
            return Err(ConversionError::mismatch(T::TYPE_NAME, host.kind_name()));
        }
        T::from_host(&host)
    }

    pub fn remove(&mut self, key: &str) -> Option<VariantValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariantValue)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<VariantValue>> FromIterator<(K, V)> for VariantMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = VariantMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl FromHost for VariantMap {
    const TYPE_NAME: &'static str = "object";
    const ACCEPTS: HostKinds = HostKinds::OBJECT;

    fn is_convertible(value: &HostValue) -> bool {
        value.is_object()
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConversionError::mismatch("object", value.kind_name()))?;
        Ok(obj
            .iter()
            .map(|(key, value)| (key, VariantValue::classify(value)))
            .collect())
    }
}

impl IntoHost for VariantMap {
    fn into_host(self) -> HostValue {
        let mut entries: Vec<_> = self.entries.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        HostValue::Object(entries.into_iter().map(|(k, v)| (k, v.into_host())).collect::<HostObject>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(map: &VariantMap) -> VariantMap {
        VariantMap::from_host(&map.clone().into_host()).unwrap()
    }

    #[test]
    fn scalar_priority() {
        assert_eq!(VariantValue::classify(&"12".into()), VariantValue::String("12".into()));
        assert_eq!(VariantValue::classify(&true.into()), VariantValue::Bool(true));
        assert_eq!(VariantValue::classify(&1.into()), VariantValue::Int16(1));
        assert_eq!(VariantValue::classify(&40000.into()), VariantValue::UInt16(40000));
        assert_eq!(VariantValue::classify(&(-70000).into()), VariantValue::Int32(-70000));
        assert_eq!(VariantValue::classify(&3_000_000_000u32.into()), VariantValue::UInt32(3_000_000_000));
        assert_eq!(
            VariantValue::classify(&HostValue::Number(-5e9)),
            VariantValue::Int64(-5_000_000_000)
        );
        assert_eq!(
            VariantValue::classify(&HostValue::Number(1e19)),
            VariantValue::UInt64(10_000_000_000_000_000_000)
        );
        assert_eq!(VariantValue::classify(&2.5.into()), VariantValue::Float64(2.5));
    }

    #[test]
    fn integral_float_resolves_to_integer() {
        assert_eq!(VariantValue::classify(&2.0.into()), VariantValue::Int16(2));
    }

    #[test]
    fn sentinels() {
        assert_eq!(VariantValue::classify(&HostValue::Null), VariantValue::Null);
        assert_eq!(VariantValue::classify(&HostValue::Undefined), VariantValue::Undefined);
        let promise = crate::host::Promise::resolved(1.into());
        assert!(VariantValue::classify(&promise.into()).is_undefined());
        assert!(VariantValue::classify(&HostValue::BigInt(i128::MAX)).is_undefined());
    }

    #[test]
    fn bigint_classifies_as_wide_integer() {
        assert_eq!(VariantValue::classify(&HostValue::BigInt(5)), VariantValue::Int64(5));
        assert_eq!(
            VariantValue::classify(&HostValue::BigInt(u64::MAX as i128)),
            VariantValue::UInt64(u64::MAX)
        );
    }

    #[test]
    fn homogeneous_array_shares_one_kind() {
        let arr = HostValue::Array(vec![1.into(), 70000.into()]);
        assert_eq!(
            VariantValue::classify(&arr),
            VariantValue::List(vec![VariantValue::Int32(1), VariantValue::Int32(70000)])
        );
    }

    #[test]
    fn heterogeneous_array_classifies_elementwise() {
        let arr = HostValue::Array(vec![1.into(), "a".into(), HostValue::Null]);
        assert_eq!(
            VariantValue::classify(&arr),
            VariantValue::List(vec![
                VariantValue::Int16(1),
                VariantValue::String("a".into()),
                VariantValue::Null
            ])
        );
    }

    #[test]
    fn empty_array_is_empty_list() {
        assert_eq!(VariantValue::classify(&HostValue::Array(vec![])), VariantValue::List(vec![]));
    }

    #[test]
    fn nested_objects_become_maps() {
        let inner = HostObject::new().with("depth", 2);
        let outer = HostObject::new().with("inner", inner).with("name", "x");
        let map = VariantMap::from_host(&outer.into()).unwrap();
        let VariantValue::Map(inner) = map.get("inner").unwrap() else {
            panic!("expected nested map");
        };
        assert_eq!(inner.get("depth"), Some(&VariantValue::Int16(2)));
    }

    #[test]
    fn callables_are_shared() {
        let f = HostFunction::new("cb", |_| Ok(HostValue::Undefined));
        let obj = HostObject::new().with("cb", f.clone());
        let map = VariantMap::from_host(&obj.into()).unwrap();
        let back = map.into_host();
        let back_fn = back.as_object().unwrap().get("cb").unwrap().as_function().unwrap();
        assert!(back_fn.ptr_eq(&f));
    }

    #[test]
    fn unambiguous_roundtrip_is_lossless() {
        let map: VariantMap = [
            ("s", VariantValue::from("text")),
            ("b", VariantValue::from(false)),
            ("i16", VariantValue::from(-3i16)),
            ("u16", VariantValue::from(60000u16)),
            ("i32", VariantValue::from(-100000i32)),
            ("u32", VariantValue::from(4_000_000_000u32)),
            ("f", VariantValue::from(0.25)),
            ("n", VariantValue::Null),
            ("list", VariantValue::List(vec!["a".into(), "b".into()])),
        ]
        .into_iter()
        .collect();
        assert_eq!(roundtrip(&map), map);
    }

    #[test]
    fn classification_is_deterministic() {
        let obj = HostObject::new().with("v", 7).with("w", "7");
        let first = VariantMap::from_host(&obj.clone().into()).unwrap();
        for _ in 0..10 {
            assert_eq!(VariantMap::from_host(&obj.clone().into()).unwrap(), first);
        }
        assert_eq!(first.get("v"), Some(&VariantValue::Int16(7)));
    }

    #[test]
    fn get_as_uses_registry() {
        let map: VariantMap = [("n", VariantValue::from(12i32)), ("s", VariantValue::from("hi"))]
            .into_iter()
            .collect();
        assert_eq!(map.get_as::<u8>("n").unwrap(), 12);
        assert_eq!(map.get_as::<String>("s").unwrap(), "hi");
        assert!(map.get_as::<bool>("n").is_err());
        assert_eq!(map.get_as::<Option<i32>>("missing").unwrap(), None);
    }

    #[test]
    fn into_host_orders_keys() {
        let map: VariantMap = [("b", 1i32), ("a", 2i32)].into_iter().collect();
        let host = map.into_host();
        let keys: Vec<_> = host.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(!VariantMap::is_convertible(&HostValue::Array(vec![])));
        assert!(VariantMap::from_host(&1.into()).is_err());
    }
}
