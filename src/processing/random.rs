//! Randomized selection and permutation. Every function takes the random source explicitly, so
//! a seeded [`rand::rngs::StdRng`] makes results reproducible.

use rand::Rng;

use crate::error::{EngineError, EngineResult};
use crate::inspect::{require_non_negative, require_sequence};
use crate::value::{Sequence, Value};

/// A uniformly chosen element, or `Null` for an empty sequence.
pub fn sample<R: Rng + ?Sized>(data: &Value, rng: &mut R) -> EngineResult<Value> {
    let seq = require_sequence("sample", data)?;
    if seq.is_empty() {
        return Ok(Value::Null);
    }
    Ok(seq.items()[rng.random_range(0..seq.len())].clone())
}

/// `n` elements at distinct positions, chosen by reservoir sampling. Returns `data` unchanged
/// when `n` covers the whole sequence.
pub fn sample_size<R: Rng + ?Sized>(data: &Value, n: i64, rng: &mut R) -> EngineResult<Value> {
    const OP: &str = "sample_size";
    let seq = require_sequence(OP, data)?;
    let n = require_non_negative(OP, n)?;
    if n >= seq.len() {
        return Ok(data.clone());
    }

    let mut reservoir: Vec<usize> = (0..n).collect();
    for i in n..seq.len() {
        let j = rng.random_range(0..=i);
        if j < n {
            reservoir[j] = i;
        }
    }
    let items = reservoir.into_iter().map(|i| seq.items()[i].clone()).collect();
    Ok(Value::Seq(Sequence::from_parts(seq.element_type().clone(), items)))
}

/// Fisher-Yates shuffle of `data` in place.
pub fn shuffle<R: Rng + ?Sized>(data: &mut Value, rng: &mut R) -> EngineResult<()> {
    const OP: &str = "shuffle";
    let items = match data {
        Value::Seq(seq) => seq.items_mut(),
        Value::Null => return Err(EngineError::NilInput { operation: OP }),
        other => {
            return Err(EngineError::WrongShape {
                operation: OP,
                expected: "sequence",
                found: other.shape(),
            });
        }
    };
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
    Ok(())
}
