//! `rust-collection-processing` is a library of sequence and map algorithms (chunking, filtering,
//! mapping, reducing, set algebra, ordering, sampling) over containers whose element types are
//! only known at runtime.
//!
//! Data is carried as a [`value::Value`]: scalars, typed [`value::Sequence`]s, typed
//! [`value::MapValue`]s and schema-typed [`types::Record`]s. Callbacks are [`inspect::Callback`]s:
//! a closure plus a declared [`inspect::Signature`], which every algorithm checks against the
//! input's element type before visiting the first element.
//!
//! ## Quick example
//!
//! ```rust
//! use rust_collection_processing::inspect::Callback;
//! use rust_collection_processing::processing::{group_by, order_by, SortOptions};
//! use rust_collection_processing::types::DataType;
//! use rust_collection_processing::value::{Key, Value};
//!
//! let words = Value::from(vec!["pear", "fig", "apple", "kiwi"]);
//!
//! let mut len = Callback::transform(DataType::Utf8, DataType::Int64, |v| {
//!     Value::from(v.as_str().map_or(0, |s| s.len() as i64))
//! });
//! let sorted = order_by(&words, &mut len, SortOptions::default()).unwrap();
//! assert_eq!(sorted, Value::from(vec!["fig", "pear", "kiwi", "apple"]));
//!
//! let groups = group_by(&words, &mut len).unwrap();
//! let groups = groups.as_map().unwrap();
//! assert_eq!(groups.get(&Key::from(4)), Some(&Value::from(vec!["pear", "kiwi"])));
//! ```
//!
//! ## Errors
//!
//! Every fallible operation returns [`EngineResult`]. Failures name the operation that raised
//! them; see [`EngineError`] for the kinds.
//!
//! ## Modules
//!
//! - [`value`]: runtime values, sequences, maps and hashable keys
//! - [`types`]: data types, shapes, schemas and records
//! - [`inspect`]: value descriptors and callback validation
//! - [`processing`]: the collection algorithms
//! - [`execution`]: concurrent ordering on a dedicated thread pool, with metrics
//! - [`chain`]: fluent step-by-step wrapper with observer reporting
//! - [`observability`]: observer hooks for operation outcomes
//! - [`error`]: error types used across the crate

pub mod chain;
pub mod error;
pub mod execution;
pub mod inspect;
pub mod observability;
pub mod processing;
pub mod types;
pub mod value;

pub use error::{EngineError, EngineResult};
