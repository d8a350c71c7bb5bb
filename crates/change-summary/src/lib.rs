//! Dirty-checking change observation.
//!
//! Observers watch a path below a root value ([`PathObserver`]), the own
//! properties of an object ([`ObjectObserver`]) or the contents of an array
//! ([`ArrayObserver`]). Mutations are not reported as they happen: a
//! [`Scheduler`] checkpoint visits every observer, computes what changed
//! since its last report and invokes its callback, repeating until nothing
//! changes any more.
//!
//! Changes are detected either by diffing snapshots
//! ([`ChangeStrategy::Polling`]) or from the mutation records the model
//! emits ([`ChangeStrategy::Records`]); callbacks see the same payloads in
//! both modes.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use change_summary::{PathChange, PathObserver, Scheduler};
//! use change_summary_model::Value;
//! use serde_json::json;
//!
//! let scheduler = Scheduler::default();
//! let model = Value::from(json!({"user": {"name": "ada"}}));
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let sink = log.clone();
//! let observer = PathObserver::new(&scheduler, &model, "user.name", move |change: &PathChange, _| {
//!     sink.borrow_mut().push((change.old_value.clone(), change.value.clone()));
//!     Ok(())
//! })
//! .unwrap();
//!
//! model.get_property("user").set_property("name", Value::from("grace"));
//! scheduler.perform_microtask_checkpoint().unwrap();
//!
//! assert_eq!(*log.borrow(), vec![(Value::from("ada"), Value::from("grace"))]);
//! assert_eq!(observer.value(), Value::from("grace"));
//!
//! // Nothing changed since: the next checkpoint reports nothing.
//! assert!(scheduler.perform_microtask_checkpoint().unwrap().is_quiet());
//! ```

pub mod array_observer;
pub mod config;
pub mod error;
pub mod object_diff;
pub mod object_observer;
pub mod observed_set;
pub mod observer;
pub mod path_observer;
pub mod reduction;
pub mod scheduler;
pub mod source;
pub mod splice;

pub use array_observer::{ArrayObserver, ArraySource};
pub use config::{CycleLimitPolicy, SchedulerConfig, MAX_DIRTY_CHECK_CYCLES};
pub use error::{BoxError, CallbackError, CheckpointError, ObserverError};
pub use object_diff::{diff_object_from_change_records, diff_object_from_old_object, ObjectDiff, PropertySnapshot};
pub use object_observer::{ObjectObserver, ObjectSource};
pub use observed_set::ObservedSet;
pub use observer::{Callback, Observer, ObserverState};
pub use path_observer::{PathChange, PathObserver, PathSource};
pub use reduction::ArrayReduction;
pub use scheduler::{CheckpointReport, Scheduler};
pub use source::{ChangeSource, ChangeStrategy};
pub use splice::{
    apply_splices, calc_splices, calculate_splices, create_initial_splices, merge_splice, project_array_splices,
    Splice,
};

pub use change_summary_path::{get_path, get_value_at_path, is_path_valid, set_value_at_path, Path, PathError};
