//! Positional search over sequences.
//!
//! Start offsets may be negative, meaning "counted from the end". Forward searches start at
//! `max(0, len + from)`; backward searches start at `len + from` and clamp positive offsets to the
//! last element. Equality is native value equality, so `Int64(3)` and `Float64(3.0)` never match.

use crate::error::{EngineError, EngineResult};
use crate::inspect::{require_collection, require_sequence, Callback, Collection, Requirement};
use crate::value::Value;

fn forward_start(len: usize, from_index: i64) -> Option<usize> {
    let start = if from_index < 0 {
        (len as i64 + from_index).max(0)
    } else {
        from_index
    };
    usize::try_from(start).ok().filter(|s| *s < len)
}

fn backward_start(len: usize, from_index: i64) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let start = if from_index < 0 {
        len as i64 + from_index
    } else {
        from_index.min(len as i64 - 1)
    };
    usize::try_from(start).ok()
}

/// Position of the first element equal to `search`, scanning forward from `from_index`.
pub fn index_of(data: &Value, search: &Value, from_index: i64) -> EngineResult<Option<usize>> {
    let items = require_sequence("index_of", data)?.items();
    Ok(forward_start(items.len(), from_index)
        .and_then(|start| (start..items.len()).find(|&i| &items[i] == search)))
}

/// Position of the last element equal to `search`, scanning backward from `from_index`
/// (the last element when `None`).
pub fn last_index_of(data: &Value, search: &Value, from_index: Option<i64>) -> EngineResult<Option<usize>> {
    let items = require_sequence("last_index_of", data)?.items();
    let from = from_index.unwrap_or(items.len() as i64 - 1);
    Ok(backward_start(items.len(), from)
        .and_then(|start| (0..=start).rev().find(|&i| &items[i] == search)))
}

fn scan(
    operation: &'static str,
    data: &Value,
    predicate: &mut Callback<'_>,
    forward: bool,
    from_index: Option<i64>,
) -> EngineResult<Option<usize>> {
    let seq = require_sequence(operation, data)?;
    predicate.inspect(operation, seq.element_type(), None, Requirement::Predicate)?;
    let items = seq.items();

    if forward {
        let Some(start) = forward_start(items.len(), from_index.unwrap_or(0)) else {
            return Ok(None);
        };
        for i in start..items.len() {
            if predicate.test(operation, &items[i], None, i)? {
                return Ok(Some(i));
            }
        }
    } else {
        let from = from_index.unwrap_or(items.len() as i64 - 1);
        let Some(start) = backward_start(items.len(), from) else {
            return Ok(None);
        };
        for i in (0..=start).rev() {
            if predicate.test(operation, &items[i], None, i)? {
                return Ok(Some(i));
            }
        }
    }
    Ok(None)
}

/// First element at or after `from_index` satisfying `predicate`.
pub fn find(data: &Value, predicate: &mut Callback<'_>, from_index: i64) -> EngineResult<Option<Value>> {
    let pos = scan("find", data, predicate, true, Some(from_index))?;
    Ok(pos.map(|i| element_at(data, i)))
}

/// Position of the first element at or after `from_index` satisfying `predicate`.
pub fn find_index(data: &Value, predicate: &mut Callback<'_>, from_index: i64) -> EngineResult<Option<usize>> {
    scan("find_index", data, predicate, true, Some(from_index))
}

/// Last element at or before `last_index` (the end when `None`) satisfying `predicate`.
pub fn find_last(
    data: &Value,
    predicate: &mut Callback<'_>,
    last_index: Option<i64>,
) -> EngineResult<Option<Value>> {
    let pos = scan("find_last", data, predicate, false, last_index)?;
    Ok(pos.map(|i| element_at(data, i)))
}

/// Position of the last element at or before `last_index` satisfying `predicate`.
pub fn find_last_index(
    data: &Value,
    predicate: &mut Callback<'_>,
    last_index: Option<i64>,
) -> EngineResult<Option<usize>> {
    scan("find_last_index", data, predicate, false, last_index)
}

fn element_at(data: &Value, i: usize) -> Value {
    data.as_sequence()
        .and_then(|s| s.items().get(i))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Whether `target` occurs in `data`.
///
/// - strings: substring test starting at character `from_index`; `target` must be a string.
/// - sequences: equality scan starting at `from_index` (negative counts from the end).
/// - maps: equality scan over values only; `from_index` is ignored.
pub fn includes(data: &Value, target: &Value, from_index: i64) -> EngineResult<bool> {
    const OP: &str = "includes";
    if let Value::Utf8(haystack) = data {
        let Value::Utf8(needle) = target else {
            return Err(EngineError::TypeMismatch {
                operation: OP,
                message: format!("cannot search a string for {}", target.data_type()),
            });
        };
        let len = haystack.chars().count();
        let Some(start) = forward_start(len, from_index) else {
            return Ok(false);
        };
        let tail: String = haystack.chars().skip(start).collect();
        return Ok(tail.contains(needle.as_str()));
    }

    match require_collection(OP, data)? {
        Collection::Seq(s) => Ok(forward_start(s.len(), from_index)
            .is_some_and(|start| s.items()[start..].iter().any(|v| v == target))),
        Collection::Map(m) => Ok(m.values().any(|v| v == target)),
    }
}

/// Element at `index`; negative indexes count from the end. `None` when out of range.
pub fn nth(data: &Value, index: i64) -> EngineResult<Option<Value>> {
    let items = require_sequence("nth", data)?.items();
    let resolved = if index < 0 {
        items.len() as i64 + index
    } else {
        index
    };
    Ok(usize::try_from(resolved)
        .ok()
        .and_then(|i| items.get(i))
        .cloned())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{find, find_index, find_last, find_last_index, includes, index_of, last_index_of, nth};
    use crate::error::EngineError;
    use crate::inspect::Callback;
    use crate::types::DataType;
    use crate::value::{Key, MapValue, Value};

    fn robins() -> Value {
        Value::from(vec!["damian", "grayson", "cass", "tim", "tim", "jason", "steph"])
    }

    #[rstest]
    #[case(0, Some(3))]
    #[case(4, Some(4))]
    #[case(-4, Some(3))]
    #[case(-2, None)]
    #[case(-100, Some(3))]
    #[case(7, None)]
    fn index_of_honours_offsets(#[case] from: i64, #[case] expected: Option<usize>) {
        assert_eq!(index_of(&robins(), &Value::from("tim"), from).unwrap(), expected);
    }

    #[rstest]
    #[case(None, Some(4))]
    #[case(Some(3), Some(3))]
    #[case(Some(-4), Some(3))]
    #[case(Some(-5), None)]
    #[case(Some(2), None)]
    #[case(Some(100), Some(4))]
    #[case(Some(-100), None)]
    fn last_index_of_honours_offsets(#[case] from: Option<i64>, #[case] expected: Option<usize>) {
        assert_eq!(last_index_of(&robins(), &Value::from("tim"), from).unwrap(), expected);
    }

    #[test]
    fn index_of_uses_native_equality() {
        let data = Value::from(vec![1.0, 3.0]);
        assert_eq!(index_of(&data, &Value::from(3), 0).unwrap(), None);
        assert_eq!(index_of(&data, &Value::from(3.0), 0).unwrap(), Some(1));
    }

    #[test]
    fn index_of_rejects_nil() {
        assert_eq!(
            index_of(&Value::Null, &Value::from(1), 0).unwrap_err(),
            EngineError::NilInput { operation: "index_of" }
        );
    }

    #[test]
    fn find_family_respects_bounds() {
        let data = Value::from(vec![1, 2, 3, 4, 5, 6]);
        let mut even = Callback::predicate(DataType::Int64, |v| v.as_i64().unwrap() % 2 == 0);

        assert_eq!(find(&data, &mut even, 0).unwrap(), Some(Value::from(2)));
        assert_eq!(find(&data, &mut even, 2).unwrap(), Some(Value::from(4)));
        assert_eq!(find(&data, &mut even, -1).unwrap(), Some(Value::from(6)));
        assert_eq!(find_index(&data, &mut even, 6).unwrap(), None);

        assert_eq!(find_last(&data, &mut even, None).unwrap(), Some(Value::from(6)));
        assert_eq!(find_last(&data, &mut even, Some(4)).unwrap(), Some(Value::from(4)));
        assert_eq!(find_last_index(&data, &mut even, Some(-3)).unwrap(), Some(3));
        assert_eq!(find_last_index(&data, &mut even, Some(0)).unwrap(), None);
    }

    #[test]
    fn find_passes_index_to_binary_predicates() {
        let data = Value::from(vec!["a", "b", "c"]);
        let mut second = Callback::indexed_predicate(DataType::Utf8, |_, i| i == 1);
        assert_eq!(find(&data, &mut second, 0).unwrap(), Some(Value::from("b")));
    }

    #[test]
    fn find_validates_predicate_before_scanning() {
        let mut calls = 0;
        let mut wrong = Callback::predicate(DataType::Utf8, |_| {
            calls += 1;
            true
        });
        let err = find(&Value::from(vec![1]), &mut wrong, 0).unwrap_err();
        drop(wrong);
        assert!(matches!(err, EngineError::ParameterTypeMismatch { .. }));
        assert_eq!(calls, 0);
    }

    #[test]
    fn includes_covers_strings_sequences_and_map_values() {
        assert!(includes(&Value::from("batman"), &Value::from("tma"), 0).unwrap());
        assert!(!includes(&Value::from("batman"), &Value::from("bat"), 1).unwrap());
        assert!(includes(&robins(), &Value::from("cass"), 0).unwrap());
        assert!(!includes(&robins(), &Value::from("cass"), 3).unwrap());
        assert!(includes(&robins(), &Value::from("steph"), -1).unwrap());

        let map = Value::Map(
            MapValue::from_entries(
                DataType::Utf8,
                DataType::Int64,
                [(Key::from("one"), Value::from(1))],
            )
            .unwrap(),
        );
        assert!(includes(&map, &Value::from(1), 0).unwrap());
        assert!(!includes(&map, &Value::from("one"), 0).unwrap());
    }

    #[test]
    fn nth_counts_from_either_end() {
        let data = Value::from(vec![10, 20, 30]);
        assert_eq!(nth(&data, 1).unwrap(), Some(Value::from(20)));
        assert_eq!(nth(&data, -1).unwrap(), Some(Value::from(30)));
        assert_eq!(nth(&data, -4).unwrap(), None);
        assert_eq!(nth(&data, 3).unwrap(), None);
    }
}
