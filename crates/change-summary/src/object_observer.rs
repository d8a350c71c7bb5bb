//! Observing an object's own properties.

use std::rc::Rc;

use change_summary_model::{ChangeRecord, RecordQueue, Value};

use crate::error::{BoxError, ObserverError};
use crate::object_diff::{diff_object_from_change_records, diff_object_from_old_object, ObjectDiff, PropertySnapshot};
use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::source::{ChangeSource, ChangeStrategy};

/// Diffs against a property snapshot.
#[derive(Debug)]
pub struct PollingObjectSource {
    target: Value,
    old: PropertySnapshot,
    /// Properties the last changed `check` diffed against `old`.
    checked: Option<PropertySnapshot>,
}

impl PollingObjectSource {
    pub fn new(target: Value) -> Self {
        Self {
            target,
            old: PropertySnapshot::default(),
            checked: None,
        }
    }
}

impl ChangeSource for PollingObjectSource {
    type Change = ObjectDiff;

    fn sync(&mut self, hard: bool) {
        let checked = self.checked.take();
        self.old = match checked {
            Some(snapshot) if !hard => snapshot,
            _ => PropertySnapshot::capture(&self.target),
        };
    }

    fn check(&mut self) -> Option<ObjectDiff> {
        let snapshot = PropertySnapshot::capture(&self.target);
        let diff = diff_object_from_old_object(&self.target, &self.old);
        if diff.is_empty() {
            self.checked = None;
            return None;
        }
        self.checked = Some(snapshot);
        Some(diff)
    }

    fn disconnect(&mut self) {
        self.target = Value::Undefined;
        self.old = PropertySnapshot::default();
        self.checked = None;
    }
}

/// Folds the object's mutation records.
#[derive(Debug)]
pub struct RecordObjectSource {
    target: Value,
    queue: Rc<RecordQueue>,
    records: Vec<ChangeRecord>,
}

impl RecordObjectSource {
    pub fn new(target: Value) -> Self {
        let queue = RecordQueue::new();
        target.watch(&queue);
        Self {
            target,
            queue,
            records: Vec::new(),
        }
    }
}

impl ChangeSource for RecordObjectSource {
    type Change = ObjectDiff;

    fn sync(&mut self, hard: bool) {
        if hard {
            self.queue.clear();
        }
        self.records.clear();
    }

    fn check(&mut self) -> Option<ObjectDiff> {
        self.records.extend(self.queue.take());
        if self.records.is_empty() {
            return None;
        }
        let diff = diff_object_from_change_records(&self.target, &self.records);
        (!diff.is_empty()).then_some(diff)
    }

    fn disconnect(&mut self) {
        self.target.unwatch(&self.queue);
        self.queue.clear();
        self.records.clear();
        self.target = Value::Undefined;
    }
}

#[derive(Debug)]
pub enum ObjectSource {
    Polling(PollingObjectSource),
    Records(RecordObjectSource),
}

impl ObjectSource {
    /// Arrays always poll: their records describe splices, not properties.
    pub fn new(strategy: ChangeStrategy, target: Value) -> Self {
        match (strategy, &target) {
            (ChangeStrategy::Records, Value::Object(_)) => ObjectSource::Records(RecordObjectSource::new(target)),
            _ => ObjectSource::Polling(PollingObjectSource::new(target)),
        }
    }
}

impl ChangeSource for ObjectSource {
    type Change = ObjectDiff;

    fn sync(&mut self, hard: bool) {
        match self {
            ObjectSource::Polling(source) => source.sync(hard),
            ObjectSource::Records(source) => source.sync(hard),
        }
    }

    fn check(&mut self) -> Option<ObjectDiff> {
        match self {
            ObjectSource::Polling(source) => source.check(),
            ObjectSource::Records(source) => source.check(),
        }
    }

    fn disconnect(&mut self) {
        match self {
            ObjectSource::Polling(source) => source.disconnect(),
            ObjectSource::Records(source) => source.disconnect(),
        }
    }
}

/// Observes the own properties of an object or array, reporting
/// [`ObjectDiff`]s.
pub type ObjectObserver = Observer<ObjectSource>;

impl Observer<ObjectSource> {
    /// # Errors
    ///
    /// Returns [`ObserverError::NotAnObject`] for primitive targets.
    pub fn new<F>(scheduler: &Scheduler, target: &Value, callback: F) -> Result<Self, ObserverError>
    where
        F: FnMut(&ObjectDiff, &Value) -> Result<(), BoxError> + 'static,
    {
        Self::with_token(scheduler, target, callback, Value::Undefined)
    }

    pub fn with_token<F>(scheduler: &Scheduler, target: &Value, callback: F, token: Value) -> Result<Self, ObserverError>
    where
        F: FnMut(&ObjectDiff, &Value) -> Result<(), BoxError> + 'static,
    {
        if !target.is_container() {
            return Err(ObserverError::NotAnObject {
                type_name: target.type_name(),
            });
        }
        let source = ObjectSource::new(scheduler.strategy(), target.clone());
        Ok(Observer::start(scheduler, source, Box::new(callback), token))
    }
}
