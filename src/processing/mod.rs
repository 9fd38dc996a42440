//! Collection algorithms.
//!
//! Every function takes its input by reference and returns a freshly built [`Value`](crate::value::Value); the only
//! exception is [`shuffle`], which permutes its argument in place. Callbacks are checked against
//! the input's element type before the first element is visited.
//!
//! - Iteration: [`each`], [`each_right`]
//! - Search: [`index_of`], [`last_index_of`], [`find`], [`find_index`], [`find_last`],
//!   [`find_last_index`], [`includes`], [`nth`]
//! - Selection: [`filter`], [`reject`], [`partition`], [`compact`]
//! - Transformation: [`map`], [`group_by`], [`key_by`], [`from_pairs`], [`chunk`], [`concat`],
//!   [`fill`], [`reverse`], [`take`], [`drop`] and friends
//! - Aggregation: [`count`], [`reduce`], [`size`], [`aggregate`]
//! - Set algebra: [`difference`], [`intersection`], [`union`], [`uniq`], [`pull`], [`pull_all`],
//!   [`without`], [`pull_at`], [`remove`]
//! - Ordering: [`order_by`], [`sort_by`]
//! - Randomization: [`sample`], [`sample_size`], [`shuffle`]
//!
//! ## Example: filter → map → reduce
//!
//! ```rust
//! use rust_collection_processing::inspect::Callback;
//! use rust_collection_processing::processing::{filter, map, reduce};
//! use rust_collection_processing::types::DataType;
//! use rust_collection_processing::value::Value;
//!
//! let data = Value::from(vec![1, 2, 3, 4, 5]);
//!
//! let mut odd = Callback::predicate(DataType::Int64, |v| v.as_i64().is_some_and(|n| n % 2 == 1));
//! let odds = filter(&data, &mut odd).unwrap();
//!
//! let mut square = Callback::transform(DataType::Int64, DataType::Int64, |v| {
//!     Value::from(v.as_i64().unwrap_or(0).pow(2))
//! });
//! let squares = map(&odds, &mut square).unwrap();
//!
//! let mut sum = Callback::reducer(DataType::Int64, DataType::Int64, |acc, v| {
//!     Value::from(acc.as_i64().unwrap_or(0) + v.as_i64().unwrap_or(0))
//! });
//! assert_eq!(reduce(&squares, &mut sum, Value::from(0)).unwrap(), Value::from(35));
//! ```

pub mod filter;
pub mod iteration;
pub mod map;
pub mod order;
pub mod random;
pub mod reduce;
pub mod search;
pub mod set;
pub mod slice;

pub use filter::{compact, filter, partition, reject};
pub use iteration::{each, each_right};
pub use map::{from_pairs, group_by, key_by, map};
pub use order::{order_by, sort_by, SortOptions};
pub use random::{sample, sample_size, shuffle};
pub use reduce::{aggregate, count, reduce, size, ReduceOp};
pub use search::{
    find, find_index, find_last, find_last_index, includes, index_of, last_index_of, nth,
};
pub use set::{difference, intersection, pull, pull_all, pull_at, remove, union, uniq, without};
pub use slice::{
    chunk, concat, concat_many, drop, drop_right, drop_right_while, drop_while, fill, head, initial,
    last, reverse, tail, take, take_right, take_right_while, take_while,
};
