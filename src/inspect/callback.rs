//! Callbacks and the checks applied to them.
//!
//! A [`Callback`] pairs a declared [`Signature`] with a [`Body`] whose shape the call site picks:
//! value only, value plus index (or key), or value plus key plus index. The declared signature is
//! what an operation validates before visiting any element; returned values are re-checked
//! against the declared return type as they are produced.

use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::types::DataType;
use crate::value::{Key, Value};

/// Declared parameter and return types of a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<DataType>,
    pub returns: Vec<DataType>,
}

impl Signature {
    pub fn new(params: Vec<DataType>, returns: Vec<DataType>) -> Self {
        Self { params, returns }
    }
}

/// The callable part of a [`Callback`].
pub enum Body<'a> {
    /// `(value)`
    Unary(Box<dyn FnMut(&Value) -> Value + 'a>),
    /// `(value, index)` on sequences, `(value, key)` on maps, `(acc, value)` for reducers.
    Binary(Box<dyn FnMut(&Value, &Value) -> Value + 'a>),
    /// `(value, key, index)` on maps, `(acc, value, index-or-key)` for reducers.
    Ternary(Box<dyn FnMut(&Value, &Value, &Value) -> Value + 'a>),
}

impl Body<'_> {
    fn arity(&self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
            Self::Ternary(_) => 3,
        }
    }
}

/// Parameter combination a callback accepts, as resolved against a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Value,
    ValueIndex,
    ValueKey,
    ValueKeyIndex,
}

/// What an operation needs from its callback's return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Exactly one `Bool`.
    Predicate,
    /// Exactly one value of any type; it becomes the result's element type.
    Transform,
    /// Nothing, or one `Bool` used as a continue flag.
    SideEffect,
}

impl Requirement {
    fn describe(self) -> &'static str {
        match self {
            Self::Predicate => "exactly one bool",
            Self::Transform => "exactly one value",
            Self::SideEffect => "no value or one bool",
        }
    }
}

/// Outcome of validating a callback against a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackDescriptor {
    pub arity: Arity,
    /// Declared return type, if any.
    pub return_type: Option<DataType>,
}

/// A callback with a declared signature.
pub struct Callback<'a> {
    signature: Signature,
    body: Body<'a>,
}

impl fmt::Debug for Callback<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("signature", &self.signature)
            .field("body_arity", &self.body.arity())
            .finish()
    }
}

impl<'a> Callback<'a> {
    /// Pair an arbitrary signature with a body. Mismatches are reported when an operation
    /// inspects the callback.
    pub fn new(signature: Signature, body: Body<'a>) -> Self {
        Self { signature, body }
    }

    /// `(value) -> bool`
    pub fn predicate(param: DataType, mut f: impl FnMut(&Value) -> bool + 'a) -> Self {
        Self::new(
            Signature::new(vec![param], vec![DataType::Bool]),
            Body::Unary(Box::new(move |v: &Value| Value::Bool(f(v)))),
        )
    }

    /// `(value, index) -> bool`
    pub fn indexed_predicate(param: DataType, mut f: impl FnMut(&Value, usize) -> bool + 'a) -> Self {
        Self::new(
            Signature::new(vec![param, DataType::Int64], vec![DataType::Bool]),
            Body::Binary(Box::new(move |v: &Value, i: &Value| Value::Bool(f(v, index_arg(i))))),
        )
    }

    /// `(value, key) -> bool`
    pub fn keyed_predicate(
        param: DataType,
        key: DataType,
        mut f: impl FnMut(&Value, &Value) -> bool + 'a,
    ) -> Self {
        Self::new(
            Signature::new(vec![param, key], vec![DataType::Bool]),
            Body::Binary(Box::new(move |v: &Value, k: &Value| Value::Bool(f(v, k)))),
        )
    }

    /// `(value) -> returns`
    pub fn transform(param: DataType, returns: DataType, f: impl FnMut(&Value) -> Value + 'a) -> Self {
        Self::new(
            Signature::new(vec![param], vec![returns]),
            Body::Unary(Box::new(f)),
        )
    }

    /// `(value, index) -> returns`
    pub fn indexed_transform(
        param: DataType,
        returns: DataType,
        mut f: impl FnMut(&Value, usize) -> Value + 'a,
    ) -> Self {
        Self::new(
            Signature::new(vec![param, DataType::Int64], vec![returns]),
            Body::Binary(Box::new(move |v: &Value, i: &Value| f(v, index_arg(i)))),
        )
    }

    /// `(value, key) -> returns`
    pub fn keyed_transform(
        param: DataType,
        key: DataType,
        returns: DataType,
        f: impl FnMut(&Value, &Value) -> Value + 'a,
    ) -> Self {
        Self::new(
            Signature::new(vec![param, key], vec![returns]),
            Body::Binary(Box::new(f)),
        )
    }

    /// `(value)` with no return value.
    pub fn visitor(param: DataType, mut f: impl FnMut(&Value) + 'a) -> Self {
        Self::new(
            Signature::new(vec![param], vec![]),
            Body::Unary(Box::new(move |v: &Value| {
                f(v);
                Value::Null
            })),
        )
    }

    /// `(value) -> bool`, where `false` stops the traversal.
    pub fn stoppable_visitor(param: DataType, mut f: impl FnMut(&Value) -> bool + 'a) -> Self {
        Self::new(
            Signature::new(vec![param], vec![DataType::Bool]),
            Body::Unary(Box::new(move |v: &Value| Value::Bool(f(v)))),
        )
    }

    /// `(acc, value) -> acc`
    pub fn reducer(acc: DataType, param: DataType, f: impl FnMut(&Value, &Value) -> Value + 'a) -> Self {
        Self::new(
            Signature::new(vec![acc.clone(), param], vec![acc]),
            Body::Binary(Box::new(f)),
        )
    }

    /// `(acc, value, index-or-key) -> acc`
    pub fn indexed_reducer(
        acc: DataType,
        param: DataType,
        position: DataType,
        f: impl FnMut(&Value, &Value, &Value) -> Value + 'a,
    ) -> Self {
        Self::new(
            Signature::new(vec![acc.clone(), param, position], vec![acc]),
            Body::Ternary(Box::new(f)),
        )
    }

    /// Validate an element callback against a container.
    ///
    /// `key_type` is `None` for sequences. Checks run in order: callable, arity, parameter types,
    /// return types.
    pub(crate) fn inspect(
        &self,
        operation: &'static str,
        element_type: &DataType,
        key_type: Option<&DataType>,
        requirement: Requirement,
    ) -> EngineResult<CallbackDescriptor> {
        let params = &self.signature.params;
        self.check_arity(operation)?;

        let arity = match (params.len(), key_type) {
            (1, _) => Arity::Value,
            (2, None) => Arity::ValueIndex,
            (2, Some(_)) => Arity::ValueKey,
            (3, Some(_)) => Arity::ValueKeyIndex,
            (n, None) => {
                return Err(EngineError::ArityMismatch {
                    operation,
                    message: format!("sequence callbacks take 1 or 2 parameters, got {n}"),
                });
            }
            (n, Some(_)) => {
                return Err(EngineError::ArityMismatch {
                    operation,
                    message: format!("map callbacks take 1 to 3 parameters, got {n}"),
                });
            }
        };

        check_param(operation, params, 0, element_type)?;
        match key_type {
            None => check_param(operation, params, 1, &DataType::Int64)?,
            Some(key) => {
                check_param(operation, params, 1, key)?;
                check_param(operation, params, 2, &DataType::Int64)?;
            }
        }

        let returns = &self.signature.returns;
        let ok = match requirement {
            Requirement::Predicate => returns.as_slice() == [DataType::Bool],
            Requirement::Transform => returns.len() == 1,
            Requirement::SideEffect => {
                returns.is_empty() || returns.as_slice() == [DataType::Bool]
            }
        };
        if !ok {
            return Err(EngineError::ReturnTypeMismatch {
                operation,
                expected: requirement.describe(),
                found: returns.clone(),
            });
        }

        Ok(CallbackDescriptor {
            arity,
            return_type: returns.first().cloned(),
        })
    }

    /// Validate a fold callback: `(acc, value)` or `(acc, value, index-or-key)` returning one
    /// value the accumulator parameter accepts.
    pub(crate) fn inspect_reducer(
        &self,
        operation: &'static str,
        acc_type: &DataType,
        element_type: &DataType,
        key_type: Option<&DataType>,
    ) -> EngineResult<CallbackDescriptor> {
        let params = &self.signature.params;
        self.check_arity(operation)?;

        let arity = match params.len() {
            2 => Arity::Value,
            3 if key_type.is_some() => Arity::ValueKey,
            3 => Arity::ValueIndex,
            n => {
                return Err(EngineError::ArityMismatch {
                    operation,
                    message: format!("reducers take 2 or 3 parameters, got {n}"),
                });
            }
        };

        check_param(operation, params, 0, acc_type)?;
        check_param(operation, params, 1, element_type)?;
        check_param(operation, params, 2, key_type.unwrap_or(&DataType::Int64))?;

        let returns = &self.signature.returns;
        match returns.as_slice() {
            [ret] if params[0].accepts(ret) => Ok(CallbackDescriptor {
                arity,
                return_type: Some(ret.clone()),
            }),
            _ => Err(EngineError::ReturnTypeMismatch {
                operation,
                expected: "one value of the accumulator type",
                found: returns.clone(),
            }),
        }
    }

    fn check_arity(&self, operation: &'static str) -> EngineResult<()> {
        let declared = self.signature.params.len();
        if declared == 0 {
            return Err(EngineError::NotCallable { operation });
        }
        if declared > 3 {
            return Err(EngineError::ArityMismatch {
                operation,
                message: format!("at most 3 parameters are supported, got {declared}"),
            });
        }
        if declared != self.body.arity() {
            return Err(EngineError::ArityMismatch {
                operation,
                message: format!(
                    "signature declares {declared} parameters but body takes {}",
                    self.body.arity()
                ),
            });
        }
        Ok(())
    }

    /// Call the body for one element and check the result against the declared return type.
    ///
    /// The second argument is the key on maps and the index on sequences; ternary bodies get
    /// both.
    pub(crate) fn call(
        &mut self,
        operation: &'static str,
        value: &Value,
        key: Option<&Key>,
        index: usize,
    ) -> EngineResult<Value> {
        let out = match &mut self.body {
            Body::Unary(f) => f(value),
            Body::Binary(f) => match key {
                Some(k) => f(value, &k.to_value()),
                None => f(value, &Value::from(index)),
            },
            Body::Ternary(f) => {
                let k = key.map(Key::to_value).unwrap_or(Value::Null);
                f(value, &k, &Value::from(index))
            }
        };
        self.check_return(operation, out)
    }

    /// Call a predicate; `Null` counts as `false`.
    pub(crate) fn test(
        &mut self,
        operation: &'static str,
        value: &Value,
        key: Option<&Key>,
        index: usize,
    ) -> EngineResult<bool> {
        match self.call(operation, value, key, index)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(EngineError::ReturnTypeMismatch {
                operation,
                expected: "a boolean",
                found: vec![other.data_type()],
            }),
        }
    }

    /// Call a fold body with the accumulator first.
    pub(crate) fn fold(
        &mut self,
        operation: &'static str,
        acc: &Value,
        value: &Value,
        key: Option<&Key>,
        index: usize,
    ) -> EngineResult<Value> {
        let out = match &mut self.body {
            Body::Binary(f) => f(acc, value),
            Body::Ternary(f) => match key {
                Some(k) => f(acc, value, &k.to_value()),
                None => f(acc, value, &Value::from(index)),
            },
            Body::Unary(f) => f(value),
        };
        self.check_return(operation, out)
    }

    fn check_return(&self, operation: &'static str, out: Value) -> EngineResult<Value> {
        match self.signature.returns.first() {
            Some(declared) if !declared.accepts(&out.data_type()) => {
                Err(EngineError::ReturnTypeMismatch {
                    operation,
                    expected: "a value of the declared return type",
                    found: vec![out.data_type()],
                })
            }
            _ => Ok(out),
        }
    }
}

fn index_arg(v: &Value) -> usize {
    v.as_i64().and_then(|i| usize::try_from(i).ok()).unwrap_or(0)
}

fn check_param(
    operation: &'static str,
    params: &[DataType],
    position: usize,
    provided: &DataType,
) -> EngineResult<()> {
    match params.get(position) {
        Some(expected) if !expected.accepts(provided) => Err(EngineError::ParameterTypeMismatch {
            operation,
            position,
            expected: expected.clone(),
            found: provided.clone(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{Arity, Body, Callback, Requirement, Signature};
    use crate::error::EngineError;
    use crate::types::DataType;
    use crate::value::{Key, Value};

    #[test]
    fn resolves_arity_against_container_kind() {
        let cb = Callback::indexed_predicate(DataType::Int64, |_, _| true);
        let d = cb
            .inspect("filter", &DataType::Int64, None, Requirement::Predicate)
            .unwrap();
        assert_eq!(d.arity, Arity::ValueIndex);

        let cb = Callback::keyed_predicate(DataType::Int64, DataType::Utf8, |_, _| true);
        let d = cb
            .inspect("filter", &DataType::Int64, Some(&DataType::Utf8), Requirement::Predicate)
            .unwrap();
        assert_eq!(d.arity, Arity::ValueKey);
    }

    #[test]
    fn empty_parameter_list_is_not_callable() {
        let cb = Callback::new(
            Signature::new(vec![], vec![DataType::Bool]),
            Body::Unary(Box::new(|_: &Value| Value::Bool(true))),
        );
        assert_eq!(
            cb.inspect("filter", &DataType::Int64, None, Requirement::Predicate)
                .unwrap_err(),
            EngineError::NotCallable { operation: "filter" }
        );
    }

    #[test]
    fn body_and_signature_must_agree() {
        let cb = Callback::new(
            Signature::new(vec![DataType::Int64, DataType::Int64], vec![DataType::Bool]),
            Body::Unary(Box::new(|_: &Value| Value::Bool(true))),
        );
        let err = cb
            .inspect("filter", &DataType::Int64, None, Requirement::Predicate)
            .unwrap_err();
        assert!(matches!(err, EngineError::ArityMismatch { .. }));
    }

    #[test]
    fn more_than_three_parameters_are_rejected() {
        let cb = Callback::new(
            Signature::new(vec![DataType::Any; 4], vec![DataType::Bool]),
            Body::Ternary(Box::new(|_: &Value, _: &Value, _: &Value| Value::Bool(true))),
        );
        let err = cb
            .inspect("filter", &DataType::Int64, Some(&DataType::Utf8), Requirement::Predicate)
            .unwrap_err();
        assert!(matches!(err, EngineError::ArityMismatch { operation: "filter", .. }));
        assert!(err.to_string().contains("at most 3 parameters"));
    }

    #[test]
    fn three_parameters_need_a_map() {
        let cb = Callback::new(
            Signature::new(
                vec![DataType::Int64, DataType::Any, DataType::Int64],
                vec![DataType::Bool],
            ),
            Body::Ternary(Box::new(|_: &Value, _: &Value, _: &Value| Value::Bool(true))),
        );
        assert!(matches!(
            cb.inspect("filter", &DataType::Int64, None, Requirement::Predicate),
            Err(EngineError::ArityMismatch { .. })
        ));
        let d = cb
            .inspect("filter", &DataType::Int64, Some(&DataType::Utf8), Requirement::Predicate)
            .unwrap();
        assert_eq!(d.arity, Arity::ValueKeyIndex);
    }

    #[test]
    fn parameter_types_are_checked_in_order() {
        let cb = Callback::predicate(DataType::Utf8, |_| true);
        assert_eq!(
            cb.inspect("filter", &DataType::Int64, None, Requirement::Predicate)
                .unwrap_err(),
            EngineError::ParameterTypeMismatch {
                operation: "filter",
                position: 0,
                expected: DataType::Utf8,
                found: DataType::Int64,
            }
        );

        let cb = Callback::keyed_predicate(DataType::Int64, DataType::Int64, |_, _| true);
        let err = cb
            .inspect("filter", &DataType::Int64, Some(&DataType::Utf8), Requirement::Predicate)
            .unwrap_err();
        assert!(matches!(err, EngineError::ParameterTypeMismatch { position: 1, .. }));
    }

    #[test]
    fn return_requirements() {
        let transform = Callback::transform(DataType::Int64, DataType::Utf8, |_| Value::from("x"));
        assert!(matches!(
            transform.inspect("filter", &DataType::Int64, None, Requirement::Predicate),
            Err(EngineError::ReturnTypeMismatch { .. })
        ));
        let d = transform
            .inspect("map", &DataType::Int64, None, Requirement::Transform)
            .unwrap();
        assert_eq!(d.return_type, Some(DataType::Utf8));

        let visitor = Callback::visitor(DataType::Any, |_| {});
        assert!(visitor
            .inspect("each", &DataType::Int64, None, Requirement::SideEffect)
            .is_ok());
        assert!(matches!(
            visitor.inspect("map", &DataType::Int64, None, Requirement::Transform),
            Err(EngineError::ReturnTypeMismatch { .. })
        ));
    }

    #[test]
    fn returned_values_must_match_declaration() {
        let mut cb = Callback::transform(DataType::Int64, DataType::Int64, |_| Value::from("oops"));
        assert_eq!(
            cb.call("map", &Value::from(1), None, 0).unwrap_err(),
            EngineError::ReturnTypeMismatch {
                operation: "map",
                expected: "a value of the declared return type",
                found: vec![DataType::Utf8],
            }
        );

        let mut loose = Callback::new(
            Signature::new(vec![DataType::Int64], vec![DataType::Any]),
            Body::Unary(Box::new(|_: &Value| Value::from(3))),
        );
        assert!(matches!(
            loose.test("filter", &Value::from(1), None, 0),
            Err(EngineError::ReturnTypeMismatch { .. })
        ));
    }

    #[test]
    fn binary_bodies_receive_key_or_index() {
        let mut seen = Vec::new();
        {
            let mut cb = Callback::keyed_transform(DataType::Any, DataType::Any, DataType::Any, |_, k| {
                seen.push(k.clone());
                Value::Null
            });
            cb.call("map", &Value::from(1), None, 4).unwrap();
            cb.call("map", &Value::from(1), Some(&Key::from("k")), 0).unwrap();
        }
        assert_eq!(seen, vec![Value::from(4), Value::from("k")]);
    }

    #[test]
    fn reducer_accumulator_is_validated() {
        let cb = Callback::reducer(DataType::Int64, DataType::Int64, |a, _| a.clone());
        assert!(cb
            .inspect_reducer("reduce", &DataType::Int64, &DataType::Int64, None)
            .is_ok());
        assert!(matches!(
            cb.inspect_reducer("reduce", &DataType::Utf8, &DataType::Int64, None),
            Err(EngineError::ParameterTypeMismatch { position: 0, .. })
        ));
    }
}
