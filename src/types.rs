//! Type descriptors and tabular record types.
//!
//! Every [`crate::value::Value`] container carries a [`DataType`] describing its elements, so an
//! operation can validate operands and callbacks before doing any work and can give its result
//! the same type identity as its source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::value::{Sequence, Value};

/// Logical data type of a value or of a container's elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// The type of the `Null` literal.
    Null,
    /// Accepts values of every type.
    Any,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Sequence of the inner type.
    Sequence(Box<DataType>),
    /// Map from the first type to the second.
    Map(Box<DataType>, Box<DataType>),
    /// Record with the given schema.
    Record(Schema),
}

impl DataType {
    /// Sequence of `element`.
    pub fn sequence(element: DataType) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// Map from `key` to `value`.
    pub fn map(key: DataType, value: DataType) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Returns `true` if a value of type `other` may be stored where `self` is expected.
    ///
    /// `Any` accepts everything and every type accepts `Null`. Container types are accepted
    /// element-wise.
    pub fn accepts(&self, other: &DataType) -> bool {
        match (self, other) {
            (Self::Any, _) | (_, Self::Null) => true,
            (Self::Sequence(a), Self::Sequence(b)) => a.accepts(b),
            (Self::Map(ka, va), Self::Map(kb, vb)) => ka.accepts(kb) && va.accepts(vb),
            (a, b) => a == b,
        }
    }

    /// Returns `true` if two types can be compared element-by-element, i.e. either accepts the
    /// other.
    pub fn compatible(&self, other: &DataType) -> bool {
        self.accepts(other) || other.accepts(self)
    }

    /// Returns `true` if values of this type may become map keys.
    ///
    /// `Any` is admitted here and checked per value at runtime.
    pub fn is_hashable(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Any | Self::Int64 | Self::Float64 | Self::Bool | Self::Utf8
        )
    }

    /// Narrowest type accepting both `self` and `other` (`Any` when they disagree).
    pub fn unify(&self, other: &DataType) -> DataType {
        match (self, other) {
            (Self::Null, t) | (t, Self::Null) => t.clone(),
            (a, b) if a == b => a.clone(),
            _ => Self::Any,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("nil"),
            Self::Any => f.write_str("any"),
            Self::Int64 => f.write_str("int64"),
            Self::Float64 => f.write_str("float64"),
            Self::Bool => f.write_str("bool"),
            Self::Utf8 => f.write_str("string"),
            Self::Sequence(inner) => write!(f, "[]{inner}"),
            Self::Map(k, v) => write!(f, "map[{k}]{v}"),
            Self::Record(schema) => {
                f.write_str("record{")?;
                for (i, field) in schema.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", field.name, field.data_type)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Coarse classification of a value, as seen by the value inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Ordered sequence.
    Sequence,
    /// Key/value map.
    Map,
    /// A string, accepted as a degenerate collection by a few operations.
    String,
    /// A record.
    Record,
    /// A non-string scalar.
    Scalar,
    /// Absent value.
    Nil,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequence => "sequence",
            Self::Map => "map",
            Self::String => "string",
            Self::Record => "record",
            Self::Scalar => "scalar",
            Self::Nil => "nil",
        })
    }
}

/// Rust types with a fixed [`DataType`].
///
/// Used by the `From<Vec<T>>` conversion so that literal sequences get a precise element type
/// even when empty.
pub trait Typed {
    /// The data type of every value of `Self`.
    fn data_type() -> DataType;
}

macro_rules! typed {
    ($($t:ty => $dt:expr),* $(,)?) => {
        $(impl Typed for $t {
            fn data_type() -> DataType {
                $dt
            }
        })*
    };
}

typed! {
    i64 => DataType::Int64,
    i32 => DataType::Int64,
    usize => DataType::Int64,
    f64 => DataType::Float64,
    bool => DataType::Bool,
    String => DataType::Utf8,
    &str => DataType::Utf8,
}

impl<T: Typed> Typed for Vec<T> {
    fn data_type() -> DataType {
        DataType::sequence(T::data_type())
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the shape of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A struct-like value: one value per [`Schema`] field.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Schema,
    values: Vec<Value>,
}

impl Record {
    /// Create a record, checking the values against the schema.
    pub fn new(schema: Schema, values: Vec<Value>) -> EngineResult<Self> {
        if values.len() != schema.fields.len() {
            return Err(EngineError::TypeMismatch {
                operation: "record",
                message: format!(
                    "{} values for {} fields",
                    values.len(),
                    schema.fields.len()
                ),
            });
        }
        for (field, value) in schema.fields.iter().zip(&values) {
            if !field.data_type.accepts(&value.data_type()) {
                return Err(EngineError::TypeMismatch {
                    operation: "record",
                    message: format!(
                        "field '{}' expects {}, got {}",
                        field.name,
                        field.data_type,
                        value.data_type()
                    ),
                });
            }
        }
        Ok(Self { schema, values })
    }

    /// The record's schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Field values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).and_then(|i| self.values.get(i))
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// View the rows as a sequence of [`Record`]s typed by the schema.
    ///
    /// Fails with [`EngineError::TypeMismatch`] if a row does not fit the schema.
    pub fn records(&self) -> EngineResult<Value> {
        let items = self
            .rows
            .iter()
            .map(|row| Record::new(self.schema.clone(), row.clone()).map(Value::Record))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Value::Seq(Sequence::new(
            DataType::Record(self.schema.clone()),
            items,
        )?))
    }
}
