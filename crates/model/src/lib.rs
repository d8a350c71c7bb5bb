//! change-summary-model - the observed value graph
//!
//! Observers watch mutable objects and arrays that are shared between the
//! model owner and any number of observers. This crate provides that graph:
//! [`Value`] is a dynamically typed value where [`Object`] and [`Array`] are
//! shared handles with identity, so `===`-style comparisons and in-place
//! mutation behave the way a data-binding layer expects.
//!
//! Every mutating operation on an [`Object`] or [`Array`] also appends a
//! [`ChangeRecord`] to each subscribed [`RecordQueue`], which is what the
//! record-driven change sources consume.
//!
//! # Example
//!
//! ```
//! use change_summary_model::{Array, Value};
//!
//! let arr = Array::from_vec(vec![Value::from(1), Value::from(2)]);
//! let alias = Value::Array(arr.clone());
//!
//! arr.push(3);
//! assert_eq!(alias.get_property("length"), Value::from(3));
//! assert_eq!(alias, Value::Array(arr));
//! ```

pub mod array;
pub mod equal;
pub mod fuzzer;
pub mod json;
pub mod object;
pub mod record;
pub mod value;

pub use array::Array;
pub use equal::{deep_equal, deep_equal_slices, same_value, strict_equals};
pub use fuzzer::{ArrayMutation, Fuzzer};
pub use object::Object;
pub use record::{ChangeRecord, RecordQueue};
pub use value::{index_key, Value};
