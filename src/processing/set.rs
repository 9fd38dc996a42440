//! Set algebra over sequences: difference, intersection, union/uniq and the pull/remove family.
//!
//! Membership uses native equality, so a NaN never matches anything, itself included. Hashable
//! elements are tracked in a hash set; sequences, maps and records fall back to a linear scan.

use std::collections::HashSet;

use crate::error::EngineResult;
use crate::inspect::{require_non_negative, require_operands, require_sequence, Callback};
use crate::value::{Key, Sequence, Value};

use super::filter::split;

/// Equality-keyed membership set.
#[derive(Debug, Default)]
pub(crate) struct ValueSet {
    keys: HashSet<Key>,
    unhashable: Vec<Value>,
}

impl ValueSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, value: &Value) -> bool {
        if is_nan(value) {
            return false;
        }
        match Key::from_value(value, "set") {
            Ok(key) => self.keys.contains(&key),
            Err(_) => self.unhashable.contains(value),
        }
    }

    /// Returns `true` if `value` was not yet present.
    pub(crate) fn insert(&mut self, value: &Value) -> bool {
        if is_nan(value) {
            return true;
        }
        match Key::from_value(value, "set") {
            Ok(key) => self.keys.insert(key),
            Err(_) if self.unhashable.contains(value) => false,
            Err(_) => {
                self.unhashable.push(value.clone());
                true
            }
        }
    }
}

impl<'a> FromIterator<&'a Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = &'a Value>>(iter: I) -> Self {
        let mut set = Self::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}

// `Key` folds every NaN into one key; membership must not.
fn is_nan(value: &Value) -> bool {
    matches!(value, Value::Float64(f) if f.is_nan())
}

fn same_type(seq: &Sequence, items: Vec<Value>) -> Value {
    Value::Seq(Sequence::from_parts(seq.element_type().clone(), items))
}

/// Elements of `data` absent from every sequence in `excludes`. Order and duplicates follow
/// `data`.
pub fn difference(data: &Value, excludes: &[Value]) -> EngineResult<Value> {
    const OP: &str = "difference";
    let seq = require_sequence(OP, data)?;
    let excludes = require_operands(OP, seq.element_type(), excludes)?;
    let excluded: ValueSet = excludes.iter().flat_map(|s| s.items()).collect();
    let items = seq
        .items()
        .iter()
        .filter(|v| !excluded.contains(v))
        .cloned()
        .collect();
    Ok(same_type(seq, items))
}

/// Distinct elements of `data` present in every sequence in `others`, in `data` order.
pub fn intersection(data: &Value, others: &[Value]) -> EngineResult<Value> {
    const OP: &str = "intersection";
    let seq = require_sequence(OP, data)?;
    let others = require_operands(OP, seq.element_type(), others)?;
    let sets: Vec<ValueSet> = others.iter().map(|s| s.items().iter().collect()).collect();

    let mut seen = ValueSet::new();
    let items = seq
        .items()
        .iter()
        .filter(|v| sets.iter().all(|s| s.contains(v)) && seen.insert(v))
        .cloned()
        .collect();
    Ok(same_type(seq, items))
}

/// Distinct elements of `data` followed by those of each sequence in `others`; the first
/// occurrence wins.
pub fn union(data: &Value, others: &[Value]) -> EngineResult<Value> {
    const OP: &str = "union";
    let seq = require_sequence(OP, data)?;
    let others = require_operands(OP, seq.element_type(), others)?;

    let mut element_type = seq.element_type().clone();
    for other in &others {
        if !element_type.accepts(other.element_type()) {
            element_type = element_type.unify(other.element_type());
        }
    }

    let mut seen = ValueSet::new();
    let items = std::iter::once(seq)
        .chain(others)
        .flat_map(|s| s.items())
        .filter(|v| seen.insert(v))
        .cloned()
        .collect();
    Ok(Value::Seq(Sequence::from_parts(element_type, items)))
}

/// Distinct elements of `data`; the first occurrence wins.
pub fn uniq(data: &Value) -> EngineResult<Value> {
    const OP: &str = "uniq";
    let seq = require_sequence(OP, data)?;
    let mut seen = ValueSet::new();
    let items = seq
        .items()
        .iter()
        .filter(|v| seen.insert(v))
        .cloned()
        .collect();
    Ok(same_type(seq, items))
}

/// `data` without any element equal to one of `values`.
pub fn pull(data: &Value, values: &[Value]) -> EngineResult<Value> {
    let seq = require_sequence("pull", data)?;
    let removed: ValueSet = values.iter().collect();
    Ok(same_type(
        seq,
        seq.items()
            .iter()
            .filter(|v| !removed.contains(v))
            .cloned()
            .collect(),
    ))
}

/// `data` without any element equal to an element of the `removal` sequence.
pub fn pull_all(data: &Value, removal: &Value) -> EngineResult<Value> {
    pull_sequence("pull_all", data, removal)
}

/// Same as [`pull_all`].
pub fn without(data: &Value, removal: &Value) -> EngineResult<Value> {
    pull_sequence("without", data, removal)
}

fn pull_sequence(operation: &'static str, data: &Value, removal: &Value) -> EngineResult<Value> {
    let seq = require_sequence(operation, data)?;
    let removal = require_operands(operation, seq.element_type(), std::slice::from_ref(removal))?;
    let removed: ValueSet = removal.iter().flat_map(|s| s.items()).collect();
    Ok(same_type(
        seq,
        seq.items()
            .iter()
            .filter(|v| !removed.contains(v))
            .cloned()
            .collect(),
    ))
}

/// `data` without the elements at `indices`. Indices past the end are ignored; negative indices
/// fail.
pub fn pull_at(data: &Value, indices: &[i64]) -> EngineResult<Value> {
    const OP: &str = "pull_at";
    let seq = require_sequence(OP, data)?;
    let dropped: HashSet<usize> = indices
        .iter()
        .map(|&i| require_non_negative(OP, i))
        .collect::<EngineResult<_>>()?;
    Ok(same_type(
        seq,
        seq.items()
            .iter()
            .enumerate()
            .filter(|(i, _)| !dropped.contains(i))
            .map(|(_, v)| v.clone())
            .collect(),
    ))
}

/// `(kept, removed)`: elements for which `predicate` is false, and those for which it is true.
/// Each element is visited exactly once.
pub fn remove(data: &Value, predicate: &mut Callback<'_>) -> EngineResult<(Value, Value)> {
    require_sequence("remove", data)?;
    let (removed, kept) = split("remove", data, predicate)?;
    Ok((kept, removed))
}
