//! Element-wise transforms and keyed grouping: [`map`], [`group_by`], [`key_by`], [`from_pairs`].

use crate::error::{EngineError, EngineResult};
use crate::inspect::{require_collection, require_sequence, Callback, Collection, Requirement};
use crate::types::DataType;
use crate::value::{infer_type, Key, MapValue, Sequence, Value};

use super::iteration::visit_all;

/// Validate a transform and return its declared output type.
fn transform_type(
    operation: &'static str,
    collection: Collection<'_>,
    callback: &Callback<'_>,
) -> EngineResult<DataType> {
    let descriptor = callback.inspect(
        operation,
        collection.element_type(),
        collection.key_type(),
        Requirement::Transform,
    )?;
    descriptor.return_type.ok_or(EngineError::ReturnTypeMismatch {
        operation,
        expected: "exactly one value",
        found: Vec::new(),
    })
}

/// A transform whose output is used as a map key.
fn key_type(
    operation: &'static str,
    collection: Collection<'_>,
    iteratee: &Callback<'_>,
) -> EngineResult<DataType> {
    let key_type = transform_type(operation, collection, iteratee)?;
    if !key_type.is_hashable() {
        return Err(EngineError::UnhashableKey {
            operation,
            found: key_type,
        });
    }
    Ok(key_type)
}

/// Apply `transform` to every element. The result is a sequence whose element type is the
/// callback's declared return type; maps are transformed value by value.
pub fn map(data: &Value, transform: &mut Callback<'_>) -> EngineResult<Value> {
    const OP: &str = "map";
    let collection = require_collection(OP, data)?;
    let element_type = transform_type(OP, collection, transform)?;

    let mut out = Vec::with_capacity(collection.len());
    visit_all(collection, |v| {
        out.push(transform.call(OP, v.value, v.key, v.index)?);
        Ok(())
    })?;
    Ok(Value::Seq(Sequence::from_parts(element_type, out)))
}

/// Group elements by the key `iteratee` returns. Each bucket keeps discovery order.
pub fn group_by(data: &Value, iteratee: &mut Callback<'_>) -> EngineResult<Value> {
    const OP: &str = "group_by";
    let collection = require_collection(OP, data)?;
    let key_type = key_type(OP, collection, iteratee)?;
    let element_type = collection.element_type().clone();

    let mut groups = MapValue::new(key_type, DataType::sequence(element_type.clone()));
    visit_all(collection, |v| {
        let key = Key::from_value(&iteratee.call(OP, v.value, v.key, v.index)?, OP)?;
        let bucket = groups.entry_or_insert_with(key, || {
            Value::Seq(Sequence::empty(element_type.clone()))
        });
        if let Value::Seq(items) = bucket {
            items.push_unchecked(v.value.clone());
        }
        Ok(())
    })?;
    Ok(Value::Map(groups))
}

/// Index elements by the key `iteratee` returns. The last element wins on collision.
pub fn key_by(data: &Value, iteratee: &mut Callback<'_>) -> EngineResult<Value> {
    const OP: &str = "key_by";
    let collection = require_collection(OP, data)?;
    let key_type = key_type(OP, collection, iteratee)?;

    let mut out = MapValue::new(key_type, collection.element_type().clone());
    visit_all(collection, |v| {
        let key = Key::from_value(&iteratee.call(OP, v.value, v.key, v.index)?, OP)?;
        out.insert_unchecked(key, v.value.clone());
        Ok(())
    })?;
    Ok(Value::Map(out))
}

/// Build a map from a sequence of `[key, value]` pairs.
///
/// A one-element pair maps its key to `Null`. Keys must be hashable. Key and value types come
/// from the pairs' element type, or are inferred when that is `Any`.
pub fn from_pairs(data: &Value) -> EngineResult<Value> {
    const OP: &str = "from_pairs";
    let seq = require_sequence(OP, data)?;
    let pair_type = match seq.element_type() {
        DataType::Sequence(inner) => inner.as_ref().clone(),
        DataType::Any => DataType::Any,
        other => {
            return Err(EngineError::TypeMismatch {
                operation: OP,
                message: format!("expected a sequence of pairs, found []{other}"),
            });
        }
    };
    if !pair_type.is_hashable() {
        return Err(EngineError::UnhashableKey {
            operation: OP,
            found: pair_type,
        });
    }

    let mut entries = Vec::with_capacity(seq.len());
    for item in seq.items() {
        let pair = match item {
            Value::Seq(pair) if (1..=2).contains(&pair.len()) => pair.items(),
            other => {
                return Err(EngineError::WrongShape {
                    operation: OP,
                    expected: "pair of 1 or 2 elements",
                    found: other.shape(),
                });
            }
        };
        let key = Key::from_value(&pair[0], OP)?;
        let value = pair.get(1).cloned().unwrap_or(Value::Null);
        entries.push((key, value));
    }

    let (key_type, value_type) = match pair_type {
        DataType::Any => (
            infer_type(entries.iter().map(|(k, _)| k.to_value()).collect::<Vec<_>>().iter()),
            infer_type(entries.iter().map(|(_, v)| v)),
        ),
        t => (t.clone(), t),
    };

    let mut out = MapValue::new(key_type, value_type);
    for (k, v) in entries {
        out.insert_unchecked(k, v);
    }
    Ok(Value::Map(out))
}
