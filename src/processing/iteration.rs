//! Traversal primitives shared by every algorithm, plus the public [`each`] / [`each_right`].
//!
//! Sequences are walked by position. Maps are walked in the map's enumeration order (or its
//! reverse), which is not insertion order; the index handed to callbacks is the entry's position
//! in forward enumeration order.

use std::ops::ControlFlow;

use crate::error::EngineResult;
use crate::inspect::{require_collection, Callback, Collection, Requirement};
use crate::value::{Key, MapValue, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

/// One visited element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Visit<'v> {
    pub value: &'v Value,
    /// Entry key, maps only.
    pub key: Option<&'v Key>,
    pub index: usize,
}

/// Walk `items` until `f` breaks. Returns the break payload, if any.
pub(crate) fn walk_sequence<'v, B>(
    items: &'v [Value],
    direction: Direction,
    mut f: impl FnMut(Visit<'v>) -> EngineResult<ControlFlow<B>>,
) -> EngineResult<Option<B>> {
    let mut step = |index: usize| {
        f(Visit {
            value: &items[index],
            key: None,
            index,
        })
    };
    match direction {
        Direction::Forward => {
            for index in 0..items.len() {
                if let ControlFlow::Break(b) = step(index)? {
                    return Ok(Some(b));
                }
            }
        }
        Direction::Backward => {
            for index in (0..items.len()).rev() {
                if let ControlFlow::Break(b) = step(index)? {
                    return Ok(Some(b));
                }
            }
        }
    }
    Ok(None)
}

/// Walk a map's entries until `f` breaks. Returns the break payload, if any.
pub(crate) fn walk_map<'v, B>(
    map: &'v MapValue,
    direction: Direction,
    mut f: impl FnMut(Visit<'v>) -> EngineResult<ControlFlow<B>>,
) -> EngineResult<Option<B>> {
    let mut entries: Vec<(usize, (&'v Key, &'v Value))> = map.iter().enumerate().collect();
    if direction == Direction::Backward {
        entries.reverse();
    }
    for (index, (key, value)) in entries {
        if let ControlFlow::Break(b) = f(Visit {
            value,
            key: Some(key),
            index,
        })? {
            return Ok(Some(b));
        }
    }
    Ok(None)
}

pub(crate) fn walk<'v, B>(
    collection: Collection<'v>,
    direction: Direction,
    f: impl FnMut(Visit<'v>) -> EngineResult<ControlFlow<B>>,
) -> EngineResult<Option<B>> {
    match collection {
        Collection::Seq(s) => walk_sequence(s.items(), direction, f),
        Collection::Map(m) => walk_map(m, direction, f),
    }
}

/// Visit every element without stopping.
pub(crate) fn visit_all<'v>(
    collection: Collection<'v>,
    mut f: impl FnMut(Visit<'v>) -> EngineResult<()>,
) -> EngineResult<()> {
    walk::<()>(collection, Direction::Forward, |v| {
        f(v)?;
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(())
}

fn each_in(
    operation: &'static str,
    data: &Value,
    callback: &mut Callback<'_>,
    direction: Direction,
) -> EngineResult<()> {
    let collection = require_collection(operation, data)?;
    callback.inspect(
        operation,
        collection.element_type(),
        collection.key_type(),
        Requirement::SideEffect,
    )?;
    walk::<()>(collection, direction, |v| {
        match callback.call(operation, v.value, v.key, v.index)? {
            Value::Bool(false) => Ok(ControlFlow::Break(())),
            _ => Ok(ControlFlow::Continue(())),
        }
    })?;
    Ok(())
}

/// Call `callback` for every element of a sequence or map, front to back.
///
/// A callback declaring a `bool` return stops the traversal by returning `false`.
pub fn each(data: &Value, callback: &mut Callback<'_>) -> EngineResult<()> {
    each_in("each", data, callback, Direction::Forward)
}

/// Like [`each`], back to front.
pub fn each_right(data: &Value, callback: &mut Callback<'_>) -> EngineResult<()> {
    each_in("each_right", data, callback, Direction::Backward)
}
