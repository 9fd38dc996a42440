//! Aggregation: [`count`], [`reduce`], [`size`] and the built-in numeric [`aggregate`].

use crate::error::{EngineError, EngineResult};
use crate::inspect::{require_collection, require_sequence, Callback, Requirement};
use crate::types::DataType;
use crate::value::Value;

use super::iteration::visit_all;

/// Number of elements, or of elements satisfying `predicate` when one is given.
pub fn count(data: &Value, predicate: Option<&mut Callback<'_>>) -> EngineResult<usize> {
    const OP: &str = "count";
    let collection = require_collection(OP, data)?;
    let Some(predicate) = predicate else {
        return Ok(collection.len());
    };
    predicate.inspect(
        OP,
        collection.element_type(),
        collection.key_type(),
        Requirement::Predicate,
    )?;

    let mut n = 0;
    visit_all(collection, |v| {
        if predicate.test(OP, v.value, v.key, v.index)? {
            n += 1;
        }
        Ok(())
    })?;
    Ok(n)
}

/// Left fold starting from `initial`.
///
/// The type of `initial` fixes the accumulator type and is checked against the reducer's first
/// parameter. Reducers take `(acc, value)` or `(acc, value, index)`; on maps the third argument is
/// the key.
pub fn reduce(data: &Value, reducer: &mut Callback<'_>, initial: Value) -> EngineResult<Value> {
    const OP: &str = "reduce";
    let collection = require_collection(OP, data)?;
    reducer.inspect_reducer(
        OP,
        &initial.data_type(),
        collection.element_type(),
        collection.key_type(),
    )?;

    let mut acc = initial;
    visit_all(collection, |v| {
        acc = reducer.fold(OP, &acc, v.value, v.key, v.index)?;
        Ok(())
    })?;
    Ok(acc)
}

/// Length of a sequence or map, or character count of a string.
pub fn size(data: &Value) -> EngineResult<usize> {
    match data {
        Value::Utf8(s) => Ok(s.chars().count()),
        other => require_collection("size", other).map(|c| c.len()),
    }
}

/// Built-in reductions over a numeric sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Count all elements (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Minimum numeric value, ignoring nulls.
    Min,
    /// Maximum numeric value, ignoring nulls.
    Max,
}

/// Reduce a sequence using a built-in [`ReduceOp`].
///
/// - `Count` returns `Int64(len)` for any sequence.
/// - `Sum`/`Min`/`Max` require an `Int64` or `Float64` sequence, keep its type, and return
///   `Null` if there are no non-null values.
pub fn aggregate(data: &Value, op: ReduceOp) -> EngineResult<Value> {
    const OP: &str = "aggregate";
    let seq = require_sequence(OP, data)?;
    if op == ReduceOp::Count {
        return Ok(Value::from(seq.len()));
    }

    match seq.element_type() {
        DataType::Int64 => {
            let acc = fold_numeric(seq.items().iter().filter_map(Value::as_i64), op, |a, b| a + b);
            Ok(acc.map(Value::Int64).unwrap_or(Value::Null))
        }
        DataType::Float64 => {
            let acc = fold_numeric(seq.items().iter().filter_map(Value::as_f64), op, |a, b| a + b);
            Ok(acc.map(Value::Float64).unwrap_or(Value::Null))
        }
        other => Err(EngineError::TypeMismatch {
            operation: OP,
            message: format!("{op:?} needs a numeric sequence, found []{other}"),
        }),
    }
}

fn fold_numeric<T: PartialOrd + Copy>(
    values: impl Iterator<Item = T>,
    op: ReduceOp,
    add: fn(T, T) -> T,
) -> Option<T> {
    values.fold(None, |acc, v| {
        Some(match (op, acc) {
            (_, None) => v,
            (ReduceOp::Sum, Some(a)) => add(a, v),
            (ReduceOp::Min, Some(a)) => if v < a { v } else { a },
            (ReduceOp::Max, Some(a)) => if v > a { v } else { a },
            (ReduceOp::Count, Some(a)) => a,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::{aggregate, count, reduce, size, ReduceOp};
    use crate::error::EngineError;
    use crate::inspect::Callback;
    use crate::types::DataType;
    use crate::value::{Key, MapValue, Sequence, Value};

    #[test]
    fn count_with_and_without_predicate() {
        let data = Value::from(vec![1, 2, 3, 4]);
        assert_eq!(count(&data, None).unwrap(), 4);
        let mut big = Callback::predicate(DataType::Int64, |v| v.as_i64().unwrap() > 2);
        assert_eq!(count(&data, Some(&mut big)).unwrap(), 2);
    }

    #[test]
    fn reduce_folds_left() {
        let data = Value::from(vec!["a", "b", "c"]);
        let mut join = Callback::reducer(DataType::Utf8, DataType::Utf8, |acc, v| {
            Value::from(format!("{}{}", acc.as_str().unwrap(), v.as_str().unwrap()))
        });
        assert_eq!(reduce(&data, &mut join, Value::from(">")).unwrap(), Value::from(">abc"));
    }

    #[test]
    fn reduce_with_index() {
        let data = Value::from(vec![10, 10, 10]);
        let mut weighted = Callback::indexed_reducer(DataType::Int64, DataType::Int64, DataType::Int64, |acc, v, i| {
            Value::from(acc.as_i64().unwrap() + v.as_i64().unwrap() * i.as_i64().unwrap())
        });
        assert_eq!(reduce(&data, &mut weighted, Value::from(0)).unwrap(), Value::from(30));
    }

    #[test]
    fn reduce_over_map_values_with_keys() {
        let data = Value::Map(
            MapValue::from_entries(
                DataType::Utf8,
                DataType::Int64,
                [(Key::from("x"), Value::from(2)), (Key::from("yy"), Value::from(3))],
            )
            .unwrap(),
        );
        let mut sum_key_lengths = Callback::indexed_reducer(DataType::Int64, DataType::Int64, DataType::Utf8, |acc, v, k| {
            Value::from(acc.as_i64().unwrap() + v.as_i64().unwrap() * k.as_str().unwrap().len() as i64)
        });
        assert_eq!(
            reduce(&data, &mut sum_key_lengths, Value::from(0)).unwrap(),
            Value::from(8)
        );
    }

    #[test]
    fn reduce_checks_initial_against_accumulator() {
        let mut sum = Callback::reducer(DataType::Int64, DataType::Int64, |a, _| a.clone());
        assert!(matches!(
            reduce(&Value::from(vec![1]), &mut sum, Value::from("zero")),
            Err(EngineError::ParameterTypeMismatch { position: 0, .. })
        ));
    }

    #[test]
    fn size_counts_characters_and_entries() {
        assert_eq!(size(&Value::from("añb")).unwrap(), 3);
        assert_eq!(size(&Value::from(vec![1, 2])).unwrap(), 2);
        assert_eq!(
            size(&Value::Null).unwrap_err(),
            EngineError::NilInput { operation: "size" }
        );
        assert!(matches!(size(&Value::from(1)), Err(EngineError::WrongShape { .. })));
    }

    #[test]
    fn aggregate_ignores_nulls_and_preserves_type() {
        let data = Value::Seq(
            Sequence::new(
                DataType::Float64,
                vec![Value::from(10.0), Value::Null, Value::from(5.5)],
            )
            .unwrap(),
        );
        assert_eq!(aggregate(&data, ReduceOp::Count).unwrap(), Value::from(3));
        assert_eq!(aggregate(&data, ReduceOp::Sum).unwrap(), Value::from(15.5));
        assert_eq!(aggregate(&data, ReduceOp::Min).unwrap(), Value::from(5.5));
        assert_eq!(aggregate(&data, ReduceOp::Max).unwrap(), Value::from(10.0));
        assert_eq!(aggregate(&Value::from(vec![1, 2, 3]), ReduceOp::Sum).unwrap(), Value::from(6));
    }

    #[test]
    fn aggregate_returns_null_if_all_values_null() {
        let data = Value::Seq(Sequence::new(DataType::Int64, vec![Value::Null, Value::Null]).unwrap());
        assert_eq!(aggregate(&data, ReduceOp::Sum).unwrap(), Value::Null);
        assert!(aggregate(&Value::from(vec!["a"]), ReduceOp::Max).is_err());
    }
}
