//! Fluent wrapper that threads one [`Value`] through a series of operations.
//!
//! A failing step does not stop the chain: the error is recorded and reported, the data becomes
//! either the step's input (for failures that keep the input, see
//! [`EngineError::retains_input`]) or `Null`, and later steps still run. Set
//! [`ChainOptions::stop_on_error`] to skip every step after the first failure instead.
//!
//! ```rust
//! use rust_collection_processing::chain::Chain;
//! use rust_collection_processing::inspect::Callback;
//! use rust_collection_processing::types::DataType;
//! use rust_collection_processing::value::Value;
//!
//! let mut positive = Callback::predicate(DataType::Int64, |v| v.as_i64().is_some_and(|n| n > 0));
//! let out = Chain::new(Value::from(vec![3, -1, 4, 1, -5, 9]))
//!     .filter(&mut positive)
//!     .uniq()
//!     .chunk(2)
//!     .into_result()
//!     .unwrap();
//! assert_eq!(out, Value::from(vec![vec![3, 4], vec![1, 9]]));
//! ```

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{EngineError, EngineResult};
use crate::inspect::Callback;
use crate::observability::{report, OperationContext, OperationObserver, OperationSeverity, OperationStats};
use crate::processing::{self, SortOptions};
use crate::value::{Sequence, Value};

/// Options controlling [`Chain`] behavior.
#[derive(Clone)]
pub struct ChainOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn OperationObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: OperationSeverity,
    /// Skip every step after the first failure.
    pub stop_on_error: bool,
    /// Seed for the chain's random source. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl fmt::Debug for ChainOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("stop_on_error", &self.stop_on_error)
            .field("seed", &self.seed)
            .finish()
    }
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: OperationSeverity::Critical,
            stop_on_error: false,
            seed: None,
        }
    }
}

/// A value plus the outcome of the last failing step.
pub struct Chain {
    data: Value,
    error: Option<EngineError>,
    last_operation: Option<&'static str>,
    step: usize,
    rng: StdRng,
    options: ChainOptions,
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("data", &self.data)
            .field("error", &self.error)
            .field("last_operation", &self.last_operation)
            .field("step", &self.step)
            .field("options", &self.options)
            .finish()
    }
}

impl Chain {
    pub fn new(data: Value) -> Self {
        Self::with_options(data, ChainOptions::default())
    }

    pub fn with_options(data: Value, options: ChainOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            data,
            error: None,
            last_operation: None,
            step: 0,
            rng,
            options,
        }
    }

    /// Current data.
    pub fn value(&self) -> &Value {
        &self.data
    }

    pub fn into_value(self) -> Value {
        self.data
    }

    /// Most recent failure, if any step has failed.
    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    /// Name of the last step that ran.
    pub fn last_operation(&self) -> Option<&'static str> {
        self.last_operation
    }

    /// The data, or the most recent failure.
    pub fn into_result(self) -> EngineResult<Value> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }

    fn apply(
        mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Value, &mut StdRng) -> EngineResult<Value>,
    ) -> Self {
        if self.options.stop_on_error && self.error.is_some() {
            return self;
        }
        let ctx = OperationContext {
            operation,
            step: self.step,
        };
        self.step += 1;
        self.last_operation = Some(operation);

        let result = f(&mut self.data, &mut self.rng);
        if let Some(obs) = self.options.observer.as_deref() {
            let outcome = result.as_ref().map(|v| OperationStats {
                length: container_len(v),
            });
            report(obs, &ctx, outcome, self.options.alert_at_or_above);
        }

        match result {
            Ok(v) => self.data = v,
            Err(e) => {
                if !e.retains_input() {
                    self.data = Value::Null;
                }
                self.error = Some(e);
            }
        }
        self
    }

    pub fn chunk(self, size: i64) -> Self {
        self.apply("chunk", |d, _| processing::chunk(d, size))
    }

    pub fn compact(self) -> Self {
        self.apply("compact", |d, _| processing::compact(d))
    }

    pub fn concat(self, others: &[Value]) -> Self {
        self.apply("concat", |d, _| processing::concat_many(d, others))
    }

    pub fn fill(self, value: &Value, start: i64, end: Option<i64>) -> Self {
        self.apply("fill", |d, _| processing::fill(d, value, start, end))
    }

    pub fn reverse(self) -> Self {
        self.apply("reverse", |d, _| processing::reverse(d))
    }

    pub fn take(self, n: i64) -> Self {
        self.apply("take", |d, _| processing::take(d, n))
    }

    pub fn take_right(self, n: i64) -> Self {
        self.apply("take_right", |d, _| processing::take_right(d, n))
    }

    pub fn drop(self, n: i64) -> Self {
        self.apply("drop", |d, _| processing::drop(d, n))
    }

    pub fn drop_right(self, n: i64) -> Self {
        self.apply("drop_right", |d, _| processing::drop_right(d, n))
    }

    pub fn initial(self) -> Self {
        self.apply("initial", |d, _| processing::initial(d))
    }

    pub fn tail(self) -> Self {
        self.apply("tail", |d, _| processing::tail(d))
    }

    pub fn head(self) -> Self {
        self.apply("head", |d, _| processing::head(d).map(Value::from))
    }

    pub fn last(self) -> Self {
        self.apply("last", |d, _| processing::last(d).map(Value::from))
    }

    pub fn nth(self, index: i64) -> Self {
        self.apply("nth", |d, _| processing::nth(d, index).map(Value::from))
    }

    pub fn filter(self, predicate: &mut Callback<'_>) -> Self {
        self.apply("filter", |d, _| processing::filter(d, predicate))
    }

    pub fn reject(self, predicate: &mut Callback<'_>) -> Self {
        self.apply("reject", |d, _| processing::reject(d, predicate))
    }

    /// Replaces the data with a two-element sequence `[truthy, falsy]`.
    pub fn partition(self, predicate: &mut Callback<'_>) -> Self {
        self.apply("partition", |d, _| {
            let (truthy, falsy) = processing::partition(d, predicate)?;
            Ok(Value::Seq(Sequence::infer(vec![truthy, falsy])))
        })
    }

    pub fn find(self, predicate: &mut Callback<'_>, from_index: i64) -> Self {
        self.apply("find", |d, _| {
            processing::find(d, predicate, from_index).map(Value::from)
        })
    }

    pub fn map(self, transform: &mut Callback<'_>) -> Self {
        self.apply("map", |d, _| processing::map(d, transform))
    }

    pub fn group_by(self, iteratee: &mut Callback<'_>) -> Self {
        self.apply("group_by", |d, _| processing::group_by(d, iteratee))
    }

    pub fn key_by(self, iteratee: &mut Callback<'_>) -> Self {
        self.apply("key_by", |d, _| processing::key_by(d, iteratee))
    }

    pub fn from_pairs(self) -> Self {
        self.apply("from_pairs", |d, _| processing::from_pairs(d))
    }

    pub fn count(self, predicate: Option<&mut Callback<'_>>) -> Self {
        self.apply("count", |d, _| processing::count(d, predicate).map(Value::from))
    }

    pub fn size(self) -> Self {
        self.apply("size", |d, _| processing::size(d).map(Value::from))
    }

    pub fn reduce(self, reducer: &mut Callback<'_>, initial: Value) -> Self {
        self.apply("reduce", |d, _| processing::reduce(d, reducer, initial))
    }

    pub fn difference(self, excludes: &[Value]) -> Self {
        self.apply("difference", |d, _| processing::difference(d, excludes))
    }

    pub fn intersection(self, others: &[Value]) -> Self {
        self.apply("intersection", |d, _| processing::intersection(d, others))
    }

    pub fn union(self, others: &[Value]) -> Self {
        self.apply("union", |d, _| processing::union(d, others))
    }

    pub fn uniq(self) -> Self {
        self.apply("uniq", |d, _| processing::uniq(d))
    }

    pub fn pull(self, values: &[Value]) -> Self {
        self.apply("pull", |d, _| processing::pull(d, values))
    }

    pub fn pull_all(self, removal: &Value) -> Self {
        self.apply("pull_all", |d, _| processing::pull_all(d, removal))
    }

    pub fn without(self, removal: &Value) -> Self {
        self.apply("without", |d, _| processing::without(d, removal))
    }

    pub fn pull_at(self, indices: &[i64]) -> Self {
        self.apply("pull_at", |d, _| processing::pull_at(d, indices))
    }

    /// Keeps the elements `predicate` rejects.
    pub fn remove(self, predicate: &mut Callback<'_>) -> Self {
        self.apply("remove", |d, _| {
            processing::remove(d, predicate).map(|(kept, _)| kept)
        })
    }

    pub fn order_by(self, key_fn: &mut Callback<'_>, options: SortOptions) -> Self {
        self.apply("order_by", |d, _| processing::order_by(d, key_fn, options))
    }

    pub fn sort_by(self, key_fn: &mut Callback<'_>) -> Self {
        self.apply("sort_by", |d, _| processing::sort_by(d, key_fn))
    }

    pub fn sample(self) -> Self {
        self.apply("sample", |d, rng| processing::sample(d, rng))
    }

    pub fn sample_size(self, n: i64) -> Self {
        self.apply("sample_size", |d, rng| processing::sample_size(d, n, rng))
    }

    pub fn shuffle(self) -> Self {
        self.apply("shuffle", |d, rng| {
            processing::shuffle(d, rng)?;
            Ok(std::mem::replace(d, Value::Null))
        })
    }
}

fn container_len(value: &Value) -> Option<usize> {
    match value {
        Value::Seq(s) => Some(s.len()),
        Value::Map(m) => Some(m.len()),
        _ => None,
    }
}
