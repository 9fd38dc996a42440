//! Predicate-driven selection: [`filter`], [`reject`], [`partition`], [`compact`].
//!
//! Results keep the input's type identity: a sequence yields sequences of the same element type,
//! a map yields maps with the same key and value types.

use crate::error::EngineResult;
use crate::inspect::{require_collection, require_sequence, Callback, Collection, Requirement};
use crate::types::DataType;
use crate::value::{MapValue, Sequence, Value};

use super::iteration::{visit_all, Visit};

/// Accumulates visited elements into a container shaped like the source.
pub(crate) enum Collector {
    Seq(DataType, Vec<Value>),
    Map(MapValue),
}

impl Collector {
    pub(crate) fn like(collection: Collection<'_>) -> Self {
        match collection {
            Collection::Seq(s) => Self::Seq(s.element_type().clone(), Vec::new()),
            Collection::Map(m) => Self::Map(MapValue::new(m.key_type().clone(), m.value_type().clone())),
        }
    }

    pub(crate) fn push(&mut self, visit: &Visit<'_>) {
        match (self, visit.key) {
            (Self::Map(m), Some(k)) => {
                m.insert_unchecked(k.clone(), visit.value.clone());
            }
            (Self::Seq(_, items), _) => items.push(visit.value.clone()),
            (Self::Map(_), None) => {}
        }
    }

    pub(crate) fn finish(self) -> Value {
        match self {
            Self::Seq(element_type, items) => Value::Seq(Sequence::from_parts(element_type, items)),
            Self::Map(m) => Value::Map(m),
        }
    }
}

/// Split a collection by `predicate` into (matching, non-matching), each visited once.
pub(crate) fn split(
    operation: &'static str,
    data: &Value,
    predicate: &mut Callback<'_>,
) -> EngineResult<(Value, Value)> {
    let collection = require_collection(operation, data)?;
    predicate.inspect(
        operation,
        collection.element_type(),
        collection.key_type(),
        Requirement::Predicate,
    )?;

    let mut matched = Collector::like(collection);
    let mut rest = Collector::like(collection);
    visit_all(collection, |v| {
        if predicate.test(operation, v.value, v.key, v.index)? {
            matched.push(&v);
        } else {
            rest.push(&v);
        }
        Ok(())
    })?;
    Ok((matched.finish(), rest.finish()))
}

/// Elements for which `predicate` returns `true`.
pub fn filter(data: &Value, predicate: &mut Callback<'_>) -> EngineResult<Value> {
    split("filter", data, predicate).map(|(kept, _)| kept)
}

/// Elements for which `predicate` returns `false`.
pub fn reject(data: &Value, predicate: &mut Callback<'_>) -> EngineResult<Value> {
    split("reject", data, predicate).map(|(_, kept)| kept)
}

/// `(truthy, falsy)` partitions, each preserving relative order.
pub fn partition(data: &Value, predicate: &mut Callback<'_>) -> EngineResult<(Value, Value)> {
    split("partition", data, predicate)
}

/// Drop falsy elements: zero numbers, empty strings, `false`, `Null`.
pub fn compact(data: &Value) -> EngineResult<Value> {
    let seq = require_sequence("compact", data)?;
    let items = seq
        .items()
        .iter()
        .filter(|v| !v.is_falsy())
        .cloned()
        .collect();
    Ok(Value::Seq(Sequence::from_parts(seq.element_type().clone(), items)))
}
