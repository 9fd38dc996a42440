//! The dynamic [`Value`] model every operation consumes and produces.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::error::{EngineError, EngineResult};
use crate::types::{DataType, Record, Shape, Typed};

/// A single dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/absent value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Ordered sequence with a declared element type.
    Seq(Sequence),
    /// Hash map with declared key and value types.
    Map(MapValue),
    /// Struct-like record.
    Record(Record),
}

impl Value {
    /// The runtime type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Bool(_) => DataType::Bool,
            Self::Utf8(_) => DataType::Utf8,
            Self::Seq(s) => DataType::sequence(s.element_type.clone()),
            Self::Map(m) => DataType::map(m.key_type.clone(), m.value_type.clone()),
            Self::Record(r) => DataType::Record(r.schema().clone()),
        }
    }

    /// Coarse shape classification.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Null => Shape::Nil,
            Self::Seq(_) => Shape::Sequence,
            Self::Map(_) => Shape::Map,
            Self::Utf8(_) => Shape::String,
            Self::Record(_) => Shape::Record,
            Self::Int64(_) | Self::Float64(_) | Self::Bool(_) => Shape::Scalar,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for the zero value of the value's kind.
    ///
    /// Zero numbers, empty strings, `false` and `Null` are falsy, as is a record whose fields
    /// are all falsy. Sequences and maps are never falsy, even when empty.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Int64(v) => *v == 0,
            Self::Float64(v) => *v == 0.0,
            Self::Bool(v) => !v,
            Self::Utf8(s) => s.is_empty(),
            Self::Seq(_) | Self::Map(_) => false,
            Self::Record(r) => r.values().iter().all(Value::is_falsy),
        }
    }

    /// Build a value from JSON.
    ///
    /// Arrays become sequences with an inferred element type; objects become `Utf8`-keyed maps.
    /// Integral numbers become `Int64`, all other numbers `Float64`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int64(i),
                None => Self::Float64(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Utf8(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Seq(Sequence::infer(items.iter().map(Value::from_json).collect()))
            }
            serde_json::Value::Object(obj) => {
                let entries: HashMap<Key, Value> = obj
                    .iter()
                    .map(|(k, v)| (Key::Utf8(k.clone()), Value::from_json(v)))
                    .collect();
                let value_type = infer_type(entries.values());
                Self::Map(MapValue {
                    key_type: DataType::Utf8,
                    value_type,
                    entries,
                })
            }
        }
    }

    /// Render the value as JSON.
    ///
    /// Map keys are stringified; records become objects keyed by field name; non-finite floats
    /// become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Int64(v) => serde_json::Value::from(*v),
            Self::Float64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Utf8(s) => serde_json::Value::String(s.clone()),
            Self::Seq(s) => serde_json::Value::Array(s.items.iter().map(Value::to_json).collect()),
            Self::Map(m) => serde_json::Value::Object(
                m.entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Self::Record(r) => serde_json::Value::Object(
                r.schema()
                    .field_names()
                    .zip(r.values())
                    .map(|(name, v)| (name.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Narrowest common type of the non-null values, `Any` when there are none.
pub(crate) fn infer_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> DataType {
    match values
        .into_iter()
        .fold(DataType::Null, |acc, v| acc.unify(&v.data_type()))
    {
        DataType::Null => DataType::Any,
        t => t,
    }
}

/// An ordered sequence of values with a declared element type.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    element_type: DataType,
    items: Vec<Value>,
}

impl Sequence {
    /// Create a sequence, checking every item against `element_type`.
    pub fn new(element_type: DataType, items: Vec<Value>) -> EngineResult<Self> {
        if let Some((i, bad)) = items
            .iter()
            .enumerate()
            .find(|(_, v)| !element_type.accepts(&v.data_type()))
        {
            return Err(EngineError::TypeMismatch {
                operation: "sequence",
                message: format!(
                    "element {i} has type {}, expected {element_type}",
                    bad.data_type()
                ),
            });
        }
        Ok(Self {
            element_type,
            items,
        })
    }

    /// Create a sequence whose element type is inferred from its items.
    pub fn infer(items: Vec<Value>) -> Self {
        let element_type = infer_type(&items);
        Self {
            element_type,
            items,
        }
    }

    /// An empty sequence of `element_type`.
    pub fn empty(element_type: DataType) -> Self {
        Self {
            element_type,
            items: Vec::new(),
        }
    }

    /// Items already known to conform, e.g. a subset of another sequence of the same type.
    pub(crate) fn from_parts(element_type: DataType, items: Vec<Value>) -> Self {
        Self {
            element_type,
            items,
        }
    }

    pub fn element_type(&self) -> &DataType {
        &self.element_type
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Value] {
        &mut self.items
    }

    pub(crate) fn push_unchecked(&mut self, value: Value) {
        self.items.push(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

impl From<Sequence> for Value {
    fn from(s: Sequence) -> Self {
        Value::Seq(s)
    }
}

/// A hash map of values with declared key and value types.
///
/// Enumeration order is the hash map's order, which is neither insertion nor key order.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    key_type: DataType,
    value_type: DataType,
    entries: HashMap<Key, Value>,
}

impl MapValue {
    /// An empty map.
    pub fn new(key_type: DataType, value_type: DataType) -> Self {
        Self {
            key_type,
            value_type,
            entries: HashMap::new(),
        }
    }

    /// Build a map from entries, checking keys and values against the declared types.
    pub fn from_entries(
        key_type: DataType,
        value_type: DataType,
        entries: impl IntoIterator<Item = (Key, Value)>,
    ) -> EngineResult<Self> {
        let mut map = Self::new(key_type, value_type);
        for (k, v) in entries {
            map.insert(k, v)?;
        }
        Ok(map)
    }

    /// Insert an entry, checking it against the declared types. Returns the replaced value.
    pub fn insert(&mut self, key: Key, value: Value) -> EngineResult<Option<Value>> {
        if !self.key_type.accepts(&key.data_type()) || !self.value_type.accepts(&value.data_type()) {
            return Err(EngineError::TypeMismatch {
                operation: "map",
                message: format!(
                    "entry ({}, {}) does not fit map[{}]{}",
                    key.data_type(),
                    value.data_type(),
                    self.key_type,
                    self.value_type
                ),
            });
        }
        Ok(self.entries.insert(key, value))
    }

    pub(crate) fn insert_unchecked(&mut self, key: Key, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub(crate) fn entry_or_insert_with(&mut self, key: Key, f: impl FnOnce() -> Value) -> &mut Value {
        self.entries.entry(key).or_insert_with(f)
    }

    pub fn key_type(&self) -> &DataType {
        &self.key_type
    }

    pub fn value_type(&self) -> &DataType {
        &self.value_type
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }
}

impl From<MapValue> for Value {
    fn from(m: MapValue) -> Self {
        Value::Map(m)
    }
}

/// The hashable subset of [`Value`], used as map keys and for equality-keyed accumulation.
///
/// Floats hash and compare by their bit pattern with `-0.0` folded into `0.0` and every NaN
/// folded into one, so `Key` is a lawful `Eq + Hash`.
#[derive(Debug, Clone)]
pub enum Key {
    Null,
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Utf8(String),
}

impl Key {
    /// Convert a value into a key, failing with [`EngineError::UnhashableKey`] for containers and
    /// records.
    pub fn from_value(value: &Value, operation: &'static str) -> EngineResult<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Int64(v) => Ok(Self::Int64(*v)),
            Value::Float64(v) => Ok(Self::Float64(*v)),
            Value::Bool(v) => Ok(Self::Bool(*v)),
            Value::Utf8(s) => Ok(Self::Utf8(s.clone())),
            Value::Seq(_) | Value::Map(_) | Value::Record(_) => Err(EngineError::UnhashableKey {
                operation,
                found: value.data_type(),
            }),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Bool(_) => DataType::Bool,
            Self::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Int64(v) => Value::Int64(*v),
            Self::Float64(v) => Value::Float64(*v),
            Self::Bool(v) => Value::Bool(*v),
            Self::Utf8(s) => Value::Utf8(s.clone()),
        }
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Int64(v) => v.hash(state),
            Self::Float64(v) => canonical_bits(*v).hash(state),
            Self::Bool(v) => v.hash(state),
            Self::Utf8(s) => s.hash(state),
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("nil"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Utf8(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Utf8(s)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int64(v)
    }
}

impl From<bool> for Key {
    fn from(v: bool) -> Self {
        Key::Bool(v)
    }
}

impl From<Key> for Value {
    fn from(k: Key) -> Self {
        k.to_value()
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int64(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Utf8(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Typed + Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(Sequence::from_parts(
            T::data_type(),
            items.into_iter().map(Into::into).collect(),
        ))
    }
}
