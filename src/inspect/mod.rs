//! Input validation performed at the top of every operation.
//!
//! - [`inspect`] classifies a value (shape, element/key type, length).
//! - [`callback`] describes callbacks and checks them against a container before any element is
//!   visited.

pub mod callback;

use crate::error::{EngineError, EngineResult};
use crate::types::{DataType, Shape};
use crate::value::{MapValue, Sequence, Value};

pub use callback::{Arity, Body, Callback, CallbackDescriptor, Requirement, Signature};

/// Result of inspecting a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub shape: Shape,
    /// Element type for sequences, value type for maps, `Utf8` for strings.
    pub element_type: Option<DataType>,
    /// Key type, maps only.
    pub key_type: Option<DataType>,
    /// Item count; character count for strings; zero for scalars and nil.
    pub length: usize,
}

/// Classify any value. Never fails.
pub fn inspect(value: &Value) -> Descriptor {
    match value {
        Value::Seq(s) => Descriptor {
            shape: Shape::Sequence,
            element_type: Some(s.element_type().clone()),
            key_type: None,
            length: s.len(),
        },
        Value::Map(m) => Descriptor {
            shape: Shape::Map,
            element_type: Some(m.value_type().clone()),
            key_type: Some(m.key_type().clone()),
            length: m.len(),
        },
        Value::Utf8(s) => Descriptor {
            shape: Shape::String,
            element_type: Some(DataType::Utf8),
            key_type: None,
            length: s.chars().count(),
        },
        other => Descriptor {
            shape: other.shape(),
            element_type: None,
            key_type: None,
            length: 0,
        },
    }
}

/// A borrowed sequence or map.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Collection<'a> {
    Seq(&'a Sequence),
    Map(&'a MapValue),
}

impl<'a> Collection<'a> {
    pub(crate) fn element_type(&self) -> &'a DataType {
        match self {
            Self::Seq(s) => s.element_type(),
            Self::Map(m) => m.value_type(),
        }
    }

    pub(crate) fn key_type(&self) -> Option<&'a DataType> {
        match self {
            Self::Seq(_) => None,
            Self::Map(m) => Some(m.key_type()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Seq(s) => s.len(),
            Self::Map(m) => m.len(),
        }
    }
}

fn reject(operation: &'static str, expected: &'static str, value: &Value) -> EngineError {
    match value {
        Value::Null => EngineError::NilInput { operation },
        other => EngineError::WrongShape {
            operation,
            expected,
            found: other.shape(),
        },
    }
}

pub(crate) fn require_sequence<'a>(operation: &'static str, value: &'a Value) -> EngineResult<&'a Sequence> {
    match value {
        Value::Seq(s) => Ok(s),
        other => Err(reject(operation, "sequence", other)),
    }
}

pub(crate) fn require_collection<'a>(
    operation: &'static str,
    value: &'a Value,
) -> EngineResult<Collection<'a>> {
    match value {
        Value::Seq(s) => Ok(Collection::Seq(s)),
        Value::Map(m) => Ok(Collection::Map(m)),
        other => Err(reject(operation, "sequence or map", other)),
    }
}

/// Each operand must be a sequence whose element type is compatible with `element_type`.
pub(crate) fn require_operands<'a>(
    operation: &'static str,
    element_type: &DataType,
    operands: &'a [Value],
) -> EngineResult<Vec<&'a Sequence>> {
    operands
        .iter()
        .map(|operand| {
            let seq = require_sequence(operation, operand)?;
            if !element_type.compatible(seq.element_type()) {
                return Err(EngineError::TypeMismatch {
                    operation,
                    message: format!(
                        "operand of type []{} does not match []{element_type}",
                        seq.element_type()
                    ),
                });
            }
            Ok(seq)
        })
        .collect()
}

pub(crate) fn require_non_negative(operation: &'static str, size: i64) -> EngineResult<usize> {
    usize::try_from(size).map_err(|_| EngineError::NegativeSize { operation, size })
}

#[cfg(test)]
mod tests {
    use super::{inspect, require_collection, require_operands, require_sequence};
    use crate::error::EngineError;
    use crate::types::{DataType, Shape};
    use crate::value::Value;

    #[test]
    fn inspect_reports_shape_type_and_length() {
        let d = inspect(&Value::from(vec!["a", "b"]));
        assert_eq!(d.shape, Shape::Sequence);
        assert_eq!(d.element_type, Some(DataType::Utf8));
        assert_eq!(d.length, 2);

        let d = inspect(&Value::from("héllo"));
        assert_eq!(d.shape, Shape::String);
        assert_eq!(d.length, 5);

        let d = inspect(&Value::Null);
        assert_eq!(d.shape, Shape::Nil);
        assert_eq!(d.element_type, None);
    }

    #[test]
    fn nil_and_wrong_shape_are_distinguished() {
        assert_eq!(
            require_sequence("chunk", &Value::Null).unwrap_err(),
            EngineError::NilInput { operation: "chunk" }
        );
        assert_eq!(
            require_collection("filter", &Value::from(3)).unwrap_err(),
            EngineError::WrongShape {
                operation: "filter",
                expected: "sequence or map",
                found: Shape::Scalar,
            }
        );
    }

    #[test]
    fn operands_must_share_element_type() {
        let ok = [Value::from(vec![1]), Value::from(Vec::<i64>::new())];
        assert_eq!(require_operands("concat", &DataType::Int64, &ok).unwrap().len(), 2);

        let bad = [Value::from(vec!["x"])];
        let err = require_operands("concat", &DataType::Int64, &bad).unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch { .. }));
    }
}
