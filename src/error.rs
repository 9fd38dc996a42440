use thiserror::Error;

use crate::types::{DataType, Shape};

/// Convenience result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error type returned by every engine operation.
///
/// This is a single error enum shared across inspection, iteration and all algorithm families.
/// Every variant carries the name of the operation that rejected its input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The input value was `Null` where a container or string was required.
    #[error("{operation}: nil input")]
    NilInput { operation: &'static str },

    /// The input was not a sequence/map/string where one was required.
    #[error("{operation}: expected {expected}, found {found}")]
    WrongShape {
        operation: &'static str,
        expected: &'static str,
        found: Shape,
    },

    /// A size, count or index argument was negative.
    #[error("{operation}: negative size {size}")]
    NegativeSize { operation: &'static str, size: i64 },

    /// Element types of two operands (or of a value and its container) are incompatible.
    #[error("{operation}: type mismatch: {message}")]
    TypeMismatch {
        operation: &'static str,
        message: String,
    },

    /// A callback parameter does not accept the container's element or key type.
    #[error("{operation}: callback parameter {position} expects {expected}, container provides {found}")]
    ParameterTypeMismatch {
        operation: &'static str,
        position: usize,
        expected: DataType,
        found: DataType,
    },

    /// A callback's declared return types do not fit the operation, or a call returned a value
    /// outside its declared return type.
    #[error("{operation}: callback return types {found:?} do not satisfy {expected}")]
    ReturnTypeMismatch {
        operation: &'static str,
        expected: &'static str,
        found: Vec<DataType>,
    },

    /// A callback declares a parameter list the operation cannot supply.
    #[error("{operation}: callback arity mismatch: {message}")]
    ArityMismatch {
        operation: &'static str,
        message: String,
    },

    /// A callback declares no parameters at all.
    #[error("{operation}: callback is not callable with container elements")]
    NotCallable { operation: &'static str },

    /// A sequence/map/record was used where a hashable map key is required.
    #[error("{operation}: unhashable key of type {found}")]
    UnhashableKey {
        operation: &'static str,
        found: DataType,
    },

    /// A range's end precedes its start.
    #[error("{operation}: invalid bounds start={start} end={end}")]
    BoundsInvalid {
        operation: &'static str,
        start: i64,
        end: i64,
    },
}

impl EngineError {
    /// The operation that reported this error.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::NilInput { operation }
            | Self::WrongShape { operation, .. }
            | Self::NegativeSize { operation, .. }
            | Self::TypeMismatch { operation, .. }
            | Self::ParameterTypeMismatch { operation, .. }
            | Self::ReturnTypeMismatch { operation, .. }
            | Self::ArityMismatch { operation, .. }
            | Self::NotCallable { operation }
            | Self::UnhashableKey { operation, .. }
            | Self::BoundsInvalid { operation, .. } => operation,
        }
    }

    /// Whether the failed operation's contract hands back the original, unmodified input.
    ///
    /// Size, bounds and operand-type failures keep the caller's data; every other failure
    /// yields no container at all.
    pub fn retains_input(&self) -> bool {
        matches!(
            self,
            Self::NegativeSize { .. } | Self::BoundsInvalid { .. } | Self::TypeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::EngineError;
    use crate::types::{DataType, Shape};

    #[test]
    fn messages_name_the_operation() {
        let err = EngineError::WrongShape {
            operation: "chunk",
            expected: "sequence",
            found: Shape::Map,
        };
        assert_eq!(err.to_string(), "chunk: expected sequence, found map");
        assert_eq!(err.operation(), "chunk");

        let err = EngineError::UnhashableKey {
            operation: "from_pairs",
            found: DataType::Sequence(Box::new(DataType::Int64)),
        };
        assert_eq!(err.to_string(), "from_pairs: unhashable key of type []int64");
    }

    #[test]
    fn only_size_bounds_and_operand_failures_retain_input() {
        assert!(EngineError::NegativeSize { operation: "drop", size: -1 }.retains_input());
        assert!(
            EngineError::BoundsInvalid {
                operation: "fill",
                start: 3,
                end: 1
            }
            .retains_input()
        );
        assert!(!EngineError::NilInput { operation: "map" }.retains_input());
        assert!(!EngineError::NotCallable { operation: "map" }.retains_input());
    }
}
