//! A live fold over one property of every array element.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use change_summary_model::{Array, Value};
use change_summary_path::{Path, PathSegment};

use crate::array_observer::ArrayObserver;
use crate::error::ObserverError;
use crate::path_observer::{PathChange, PathObserver};
use crate::scheduler::{CheckpointReport, Scheduler};
use crate::splice::Splice;

type Reducer = Box<dyn Fn(&Value, &Value) -> Value>;

struct ReductionInner {
    scheduler: Scheduler,
    root: Value,
    array: Array,
    item_path: Path,
    reducer: Reducer,
    initial: Option<Value>,
    values: RefCell<Vec<Value>>,
    elements: RefCell<Vec<PathObserver>>,
    array_observer: RefCell<Option<ArrayObserver>>,
    value: RefCell<Value>,
}

impl ReductionInner {
    fn element_path(&self, index: usize) -> Path {
        let mut segments = Vec::with_capacity(self.item_path.len() + 1);
        segments.push(PathSegment::Index(index));
        segments.extend(self.item_path.segments().iter().cloned());
        Path::from_segments(segments)
    }

    fn reduce(&self) {
        let values = self.values.borrow();
        let reduced = match &self.initial {
            Some(initial) => values
                .iter()
                .fold(initial.clone(), |acc, item| (self.reducer)(&acc, item)),
            None => {
                let mut items = values.iter();
                match items.next() {
                    Some(first) => items.fold(first.clone(), |acc, item| (self.reducer)(&acc, item)),
                    None => Value::Undefined,
                }
            }
        };
        *self.value.borrow_mut() = reduced;
    }

    /// Keeps one element observer per slot and re-reads every slot.
    fn resize(self: &Rc<Self>) -> Result<(), ObserverError> {
        let len = self.array.len();
        let stale: Vec<PathObserver> = {
            let mut elements = self.elements.borrow_mut();
            if elements.len() > len {
                elements.split_off(len)
            } else {
                Vec::new()
            }
        };
        for observer in stale {
            observer.close();
        }

        let start = self.elements.borrow().len();
        for index in start..len {
            let observer = self.observe_element(index)?;
            self.elements.borrow_mut().push(observer);
        }

        let values: Vec<Value> = (0..len)
            .map(|index| self.element_path(index).get_value_from(&self.root))
            .collect();
        *self.values.borrow_mut() = values;
        Ok(())
    }

    fn observe_element(self: &Rc<Self>, index: usize) -> Result<PathObserver, ObserverError> {
        let weak: Weak<ReductionInner> = Rc::downgrade(self);
        let path = self.element_path(index).to_string();
        PathObserver::new(&self.scheduler, &self.root, &path, move |change: &PathChange, _| {
            if let Some(inner) = weak.upgrade() {
                if let Some(slot) = inner.values.borrow_mut().get_mut(index) {
                    *slot = change.value.clone();
                }
                inner.reduce();
            }
            Ok(())
        })
    }
}

/// Folds `array[i].<item_path>` over every element and keeps the result
/// current as elements change, arrive or leave.
///
/// Without an initial value the first item seeds the fold and an empty
/// array reduces to `undefined`.
///
/// # Example
///
/// ```
/// use change_summary::{ArrayReduction, Scheduler};
/// use change_summary_model::Value;
/// use serde_json::json;
///
/// let scheduler = Scheduler::default();
/// let items = Value::from(json!([{"n": 1}, {"n": 2}]));
/// let sum = ArrayReduction::new(
///     &scheduler,
///     &items,
///     "n",
///     |acc: &Value, n: &Value| {
///         Value::from(acc.as_f64().unwrap_or(0.0) + n.as_f64().unwrap_or(0.0))
///     },
///     Some(Value::from(0)),
/// )
/// .unwrap();
/// assert_eq!(sum.value(), Value::from(3));
///
/// items.as_array().unwrap().push(Value::from(json!({"n": 4})));
/// items.get_index(0).set_property("n", Value::from(10));
/// scheduler.perform_microtask_checkpoint().unwrap();
/// assert_eq!(sum.value(), Value::from(16));
/// ```
pub struct ArrayReduction {
    inner: Rc<ReductionInner>,
}

impl ArrayReduction {
    /// # Errors
    ///
    /// Fails if `array` is not an array or `item_path` does not parse.
    pub fn new<F>(
        scheduler: &Scheduler,
        array: &Value,
        item_path: &str,
        reduce: F,
        initial: Option<Value>,
    ) -> Result<Self, ObserverError>
    where
        F: Fn(&Value, &Value) -> Value + 'static,
    {
        let Value::Array(arr) = array else {
            return Err(ObserverError::NotAnArray {
                type_name: array.type_name(),
            });
        };
        let item_path = scheduler.path(item_path)?;

        let inner = Rc::new(ReductionInner {
            scheduler: scheduler.clone(),
            root: array.clone(),
            array: arr.clone(),
            item_path,
            reducer: Box::new(reduce),
            initial,
            values: RefCell::new(Vec::new()),
            elements: RefCell::new(Vec::new()),
            array_observer: RefCell::new(None),
            value: RefCell::new(Value::Undefined),
        });

        let weak = Rc::downgrade(&inner);
        let array_observer = ArrayObserver::new(scheduler, array, move |_splices: &Vec<Splice>, _| {
            if let Some(inner) = weak.upgrade() {
                inner.resize()?;
                inner.reduce();
            }
            Ok(())
        })?;
        *inner.array_observer.borrow_mut() = Some(array_observer);

        inner.resize()?;
        inner.reduce();
        Ok(Self { inner })
    }

    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Flushes the array observer, then every element observer.
    pub fn deliver(&self) -> CheckpointReport {
        let mut report = CheckpointReport::default();
        let array_observer = self.inner.array_observer.borrow().clone();
        if let Some(observer) = array_observer {
            absorb(&mut report, observer.deliver());
        }
        let elements: Vec<PathObserver> = self.inner.elements.borrow().clone();
        for observer in elements {
            absorb(&mut report, observer.deliver());
        }
        report
    }

    pub fn close(&self) {
        if let Some(observer) = self.inner.array_observer.borrow_mut().take() {
            observer.close();
        }
        let elements: Vec<PathObserver> = self.inner.elements.borrow_mut().drain(..).collect();
        for observer in elements {
            observer.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.array_observer.borrow().is_none()
    }
}

fn absorb(total: &mut CheckpointReport, part: CheckpointReport) {
    total.cycles += part.cycles;
    total.reports += part.reports;
    total.failures.extend(part.failures);
    total.cycle_limit_reached |= part.cycle_limit_reached;
}

impl fmt::Debug for ArrayReduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayReduction")
            .field("item_path", &self.inner.item_path)
            .field("elements", &self.inner.elements.borrow().len())
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

impl Drop for ArrayReduction {
    fn drop(&mut self) {
        self.close();
    }
}
