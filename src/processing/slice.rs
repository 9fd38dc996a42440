//! Structural slicing and assembly of sequences: chunk, concat, fill, reverse and the
//! take/drop family.
//!
//! Negative sizes fail with [`EngineError::NegativeSize`]; sizes past the end are clamped.

use crate::error::{EngineError, EngineResult};
use crate::inspect::{require_non_negative, require_operands, require_sequence, Callback, Requirement};
use crate::types::DataType;
use crate::value::{Sequence, Value};

fn same_type(seq: &Sequence, items: Vec<Value>) -> Value {
    Value::Seq(Sequence::from_parts(seq.element_type().clone(), items))
}

/// Split into groups of `size`; the last group may be shorter. `size == 0` yields an empty
/// sequence.
pub fn chunk(data: &Value, size: i64) -> EngineResult<Value> {
    const OP: &str = "chunk";
    let seq = require_sequence(OP, data)?;
    let size = require_non_negative(OP, size)?;
    let chunk_type = DataType::sequence(seq.element_type().clone());
    if size == 0 {
        return Ok(Value::Seq(Sequence::empty(chunk_type)));
    }
    let chunks = seq
        .items()
        .chunks(size)
        .map(|c| same_type(seq, c.to_vec()))
        .collect();
    Ok(Value::Seq(Sequence::from_parts(chunk_type, chunks)))
}

/// Append `other` to `data`. Both must be sequences of compatible element types.
pub fn concat(data: &Value, other: &Value) -> EngineResult<Value> {
    concat_many(data, std::slice::from_ref(other))
}

/// Append every sequence in `others` to `data`, in order.
///
/// The result keeps `data`'s element type when every operand conforms to it, and widens to `Any`
/// otherwise.
pub fn concat_many(data: &Value, others: &[Value]) -> EngineResult<Value> {
    const OP: &str = "concat";
    let seq = require_sequence(OP, data)?;
    let operands = require_operands(OP, seq.element_type(), others)?;

    let mut element_type = seq.element_type().clone();
    let mut items = seq.items().to_vec();
    for operand in operands {
        if !element_type.accepts(operand.element_type()) {
            element_type = element_type.unify(operand.element_type());
        }
        items.extend_from_slice(operand.items());
    }
    Ok(Value::Seq(Sequence::from_parts(element_type, items)))
}

/// Copy of `data` with positions `start..end` replaced by `value`. `end` defaults to the length
/// and both bounds are clamped to it.
pub fn fill(data: &Value, value: &Value, start: i64, end: Option<i64>) -> EngineResult<Value> {
    const OP: &str = "fill";
    let seq = require_sequence(OP, data)?;
    let start_i = require_non_negative(OP, start)?;
    let end_raw = end.unwrap_or(seq.len() as i64);
    let end_i = require_non_negative(OP, end_raw)?;
    if end_i < start_i {
        return Err(EngineError::BoundsInvalid {
            operation: OP,
            start,
            end: end_raw,
        });
    }
    if !seq.element_type().accepts(&value.data_type()) {
        return Err(EngineError::TypeMismatch {
            operation: OP,
            message: format!(
                "cannot fill []{} with {}",
                seq.element_type(),
                value.data_type()
            ),
        });
    }

    let len = seq.len();
    let mut items = seq.items().to_vec();
    for slot in &mut items[start_i.min(len)..end_i.min(len)] {
        *slot = value.clone();
    }
    Ok(same_type(seq, items))
}

/// Elements in reverse order.
pub fn reverse(data: &Value) -> EngineResult<Value> {
    let seq = require_sequence("reverse", data)?;
    Ok(same_type(seq, seq.items().iter().rev().cloned().collect()))
}

fn front(items: &[Value], n: usize) -> &[Value] {
    &items[..n]
}

fn back(items: &[Value], n: usize) -> &[Value] {
    &items[items.len() - n..]
}

fn without_front(items: &[Value], n: usize) -> &[Value] {
    &items[n..]
}

fn without_back(items: &[Value], n: usize) -> &[Value] {
    &items[..items.len() - n]
}

fn slice(
    operation: &'static str,
    data: &Value,
    n: i64,
    pick: fn(&[Value], usize) -> &[Value],
) -> EngineResult<Value> {
    let seq = require_sequence(operation, data)?;
    let n = require_non_negative(operation, n)?.min(seq.len());
    Ok(same_type(seq, pick(seq.items(), n).to_vec()))
}

/// First `n` elements.
pub fn take(data: &Value, n: i64) -> EngineResult<Value> {
    slice("take", data, n, front)
}

/// Last `n` elements.
pub fn take_right(data: &Value, n: i64) -> EngineResult<Value> {
    slice("take_right", data, n, back)
}

/// All but the first `n` elements.
pub fn drop(data: &Value, n: i64) -> EngineResult<Value> {
    slice("drop", data, n, without_front)
}

/// All but the last `n` elements.
pub fn drop_right(data: &Value, n: i64) -> EngineResult<Value> {
    slice("drop_right", data, n, without_back)
}

/// All but the last element.
pub fn initial(data: &Value) -> EngineResult<Value> {
    slice("initial", data, 1, without_back)
}

/// All but the first element.
pub fn tail(data: &Value) -> EngineResult<Value> {
    slice("tail", data, 1, without_front)
}

/// First element, `None` when empty.
pub fn head(data: &Value) -> EngineResult<Option<Value>> {
    Ok(require_sequence("head", data)?.items().first().cloned())
}

/// Last element, `None` when empty.
pub fn last(data: &Value) -> EngineResult<Option<Value>> {
    Ok(require_sequence("last", data)?.items().last().cloned())
}

/// Length of the run of elements satisfying `predicate`, counted from the front or back.
fn run_length(
    operation: &'static str,
    seq: &Sequence,
    predicate: &mut Callback<'_>,
    from_back: bool,
) -> EngineResult<usize> {
    predicate.inspect(operation, seq.element_type(), None, Requirement::Predicate)?;
    let items = seq.items();
    let mut n = 0;
    while n < items.len() {
        let i = if from_back { items.len() - 1 - n } else { n };
        if !predicate.test(operation, &items[i], None, i)? {
            break;
        }
        n += 1;
    }
    Ok(n)
}

/// Leading elements while `predicate` holds.
pub fn take_while(data: &Value, predicate: &mut Callback<'_>) -> EngineResult<Value> {
    const OP: &str = "take_while";
    let seq = require_sequence(OP, data)?;
    let n = run_length(OP, seq, predicate, false)?;
    Ok(same_type(seq, seq.items()[..n].to_vec()))
}

/// Trailing elements while `predicate` holds.
pub fn take_right_while(data: &Value, predicate: &mut Callback<'_>) -> EngineResult<Value> {
    const OP: &str = "take_right_while";
    let seq = require_sequence(OP, data)?;
    let n = run_length(OP, seq, predicate, true)?;
    Ok(same_type(seq, seq.items()[seq.len() - n..].to_vec()))
}

/// Everything after the leading run where `predicate` holds.
pub fn drop_while(data: &Value, predicate: &mut Callback<'_>) -> EngineResult<Value> {
    const OP: &str = "drop_while";
    let seq = require_sequence(OP, data)?;
    let n = run_length(OP, seq, predicate, false)?;
    Ok(same_type(seq, seq.items()[n..].to_vec()))
}

/// Everything before the trailing run where `predicate` holds.
pub fn drop_right_while(data: &Value, predicate: &mut Callback<'_>) -> EngineResult<Value> {
    const OP: &str = "drop_right_while";
    let seq = require_sequence(OP, data)?;
    let n = run_length(OP, seq, predicate, true)?;
    Ok(same_type(seq, seq.items()[..seq.len() - n].to_vec()))
}
