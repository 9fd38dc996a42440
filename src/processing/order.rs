//! Ordering: a stable merge sort over callback-computed keys.
//!
//! Keys compare natively when both are numeric (mixed `Int64`/`Float64` compare as `f64`) or
//! both strings. A numeric key compared to a string key parses the string as the numeric key's
//! type, falling back to zero. Any other pairing, booleans and nulls included, makes the run
//! unsortable, and [`order_by`] then returns the input in its original order instead of failing.

use std::cmp::Ordering;

use crate::error::{EngineError, EngineResult};
use crate::inspect::{require_sequence, Callback, Collection, Requirement};
use crate::value::{Sequence, Value};

use super::iteration::visit_all;

/// Sort direction and strategy for [`order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOptions {
    /// Ascending when `true`, descending otherwise. Ties keep input order either way.
    pub ascending: bool,
    /// Sort the two halves of every split concurrently on the rayon pool.
    pub concurrent: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            ascending: true,
            concurrent: false,
        }
    }
}

/// A sort key paired with its element.
pub(crate) type Keyed = (Value, Value);

/// Two keys of kinds that cannot be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unsortable;

/// Controls how the merge sort splits work and reports progress.
pub(crate) trait SortHooks: Sync {
    /// Whether a split of `len` elements forks its halves concurrently.
    fn fork(&self, len: usize) -> bool;

    fn on_fork(&self, _len: usize) {}

    fn on_join(&self, _len: usize) {}

    fn on_merge(&self, _len: usize) {}
}

struct Sequential;

impl SortHooks for Sequential {
    fn fork(&self, _len: usize) -> bool {
        false
    }
}

struct Forking;

impl SortHooks for Forking {
    fn fork(&self, len: usize) -> bool {
        len >= 2
    }
}

/// Compare two sort keys.
pub(crate) fn compare_keys(a: &Value, b: &Value) -> Result<Ordering, Unsortable> {
    use Value::{Float64, Int64, Utf8};
    Ok(match (a, b) {
        (Int64(x), Int64(y)) => x.cmp(y),
        (Float64(x), Float64(y)) => x.total_cmp(y),
        (Int64(x), Float64(y)) => (*x as f64).total_cmp(y),
        (Float64(x), Int64(y)) => x.total_cmp(&(*y as f64)),
        (Utf8(x), Utf8(y)) => x.cmp(y),
        (Int64(x), Utf8(s)) => x.cmp(&s.trim().parse::<i64>().unwrap_or(0)),
        (Utf8(s), Int64(y)) => s.trim().parse::<i64>().unwrap_or(0).cmp(y),
        (Float64(x), Utf8(s)) => x.total_cmp(&s.trim().parse::<f64>().unwrap_or(0.0)),
        (Utf8(s), Float64(y)) => s.trim().parse::<f64>().unwrap_or(0.0).total_cmp(y),
        _ => return Err(Unsortable),
    })
}

/// Compute one key per element, in order, before any sorting happens.
pub(crate) fn compute_keys(
    operation: &'static str,
    data: &Value,
    key_fn: &mut Callback<'_>,
) -> EngineResult<Vec<Keyed>> {
    let seq = require_sequence(operation, data)?;
    let collection = Collection::Seq(seq);
    let descriptor = key_fn.inspect(operation, seq.element_type(), None, Requirement::Transform)?;
    if descriptor.return_type.is_none() {
        return Err(EngineError::ReturnTypeMismatch {
            operation,
            expected: "exactly one value",
            found: Vec::new(),
        });
    }

    let mut keyed = Vec::with_capacity(seq.len());
    visit_all(collection, |v| {
        keyed.push((key_fn.call(operation, v.value, None, v.index)?, v.value.clone()));
        Ok(())
    })?;
    Ok(keyed)
}

/// Stable merge sort of `items` by key.
pub(crate) fn merge_sort<H: SortHooks>(
    mut items: Vec<Keyed>,
    ascending: bool,
    hooks: &H,
) -> Result<Vec<Keyed>, Unsortable> {
    let len = items.len();
    if len <= 1 {
        return Ok(items);
    }
    let right = items.split_off(len / 2);
    let left = items;

    let (left, right) = if hooks.fork(len) {
        hooks.on_fork(len);
        let halves = rayon::join(
            || merge_sort(left, ascending, hooks),
            || merge_sort(right, ascending, hooks),
        );
        hooks.on_join(len);
        halves
    } else {
        (
            merge_sort(left, ascending, hooks),
            merge_sort(right, ascending, hooks),
        )
    };
    let merged = merge(left?, right?, ascending)?;
    hooks.on_merge(len);
    Ok(merged)
}

fn merge(left: Vec<Keyed>, right: Vec<Keyed>, ascending: bool) -> Result<Vec<Keyed>, Unsortable> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let ord = compare_keys(&l.0, &r.0)?;
        // Right wins only on strict order so equal keys keep their input order.
        let take_right = if ascending {
            ord == Ordering::Greater
        } else {
            ord == Ordering::Less
        };
        if take_right {
            out.extend(right.next());
        } else {
            out.extend(left.next());
        }
    }
    out.extend(left);
    out.extend(right);
    Ok(out)
}

/// Rebuild a sequence from a sort result, or return the input unchanged if it was unsortable.
pub(crate) fn assemble(data: &Value, sorted: Result<Vec<Keyed>, Unsortable>) -> Value {
    match (data, sorted) {
        (Value::Seq(seq), Ok(sorted)) => Value::Seq(Sequence::from_parts(
            seq.element_type().clone(),
            sorted.into_iter().map(|(_, v)| v).collect(),
        )),
        _ => data.clone(),
    }
}

/// Sort a sequence by the key `key_fn` returns for each element.
///
/// The sort is stable in both directions. If two keys cannot be compared the input is returned
/// in its original order, without an error.
pub fn order_by(data: &Value, key_fn: &mut Callback<'_>, options: SortOptions) -> EngineResult<Value> {
    let keyed = compute_keys("order_by", data, key_fn)?;
    let sorted = if options.concurrent {
        merge_sort(keyed, options.ascending, &Forking)
    } else {
        merge_sort(keyed, options.ascending, &Sequential)
    };
    Ok(assemble(data, sorted))
}

/// Ascending, sequential [`order_by`].
pub fn sort_by(data: &Value, key_fn: &mut Callback<'_>) -> EngineResult<Value> {
    let keyed = compute_keys("sort_by", data, key_fn)?;
    Ok(assemble(data, merge_sort(keyed, true, &Sequential)))
}
