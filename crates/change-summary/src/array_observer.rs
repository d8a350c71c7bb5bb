//! Observing an array as a sequence of splices.

use std::rc::Rc;

use change_summary_model::{Array, ChangeRecord, RecordQueue, Value};

use crate::error::{BoxError, ObserverError};
use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::source::{ChangeSource, ChangeStrategy};
use crate::splice::{self, calculate_splices, project_array_splices, Splice};

/// Diffs against a copy of the previous contents.
#[derive(Debug)]
pub struct PollingArraySource {
    array: Array,
    old: Vec<Value>,
    /// Contents the last changed `check` diffed against `old`.
    checked: Option<Vec<Value>>,
}

impl PollingArraySource {
    pub fn new(array: Array) -> Self {
        Self {
            array,
            old: Vec::new(),
            checked: None,
        }
    }
}

impl ChangeSource for PollingArraySource {
    type Change = Vec<Splice>;

    fn sync(&mut self, hard: bool) {
        let checked = self.checked.take();
        self.old = match checked {
            Some(items) if !hard => items,
            _ => self.array.to_vec(),
        };
    }

    fn check(&mut self) -> Option<Vec<Splice>> {
        let (splices, items) = self
            .array
            .with_items(|items| (calculate_splices(items, &self.old), items.to_vec()));
        if splices.is_empty() {
            self.checked = None;
            return None;
        }
        self.checked = Some(items);
        Some(splices)
    }

    fn disconnect(&mut self) {
        self.old = Vec::new();
        self.checked = None;
    }
}

/// Projects the array's mutation records onto its current contents.
#[derive(Debug)]
pub struct RecordArraySource {
    array: Array,
    queue: Rc<RecordQueue>,
    records: Vec<ChangeRecord>,
}

impl RecordArraySource {
    pub fn new(array: Array) -> Self {
        let queue = RecordQueue::new();
        array.watch(&queue);
        Self {
            array,
            queue,
            records: Vec::new(),
        }
    }
}

impl ChangeSource for RecordArraySource {
    type Change = Vec<Splice>;

    fn sync(&mut self, hard: bool) {
        if hard {
            self.queue.clear();
        }
        self.records.clear();
    }

    fn check(&mut self) -> Option<Vec<Splice>> {
        self.records.extend(self.queue.take());
        if self.records.is_empty() {
            return None;
        }
        let splices = self
            .array
            .with_items(|items| project_array_splices(items, &self.records));
        (!splices.is_empty()).then_some(splices)
    }

    fn disconnect(&mut self) {
        self.array.unwatch(&self.queue);
        self.queue.clear();
        self.records.clear();
    }
}

#[derive(Debug)]
pub enum ArraySource {
    Polling(PollingArraySource),
    Records(RecordArraySource),
}

impl ArraySource {
    pub fn new(strategy: ChangeStrategy, array: Array) -> Self {
        match strategy {
            ChangeStrategy::Polling => ArraySource::Polling(PollingArraySource::new(array)),
            ChangeStrategy::Records => ArraySource::Records(RecordArraySource::new(array)),
        }
    }

    pub fn array(&self) -> &Array {
        match self {
            ArraySource::Polling(source) => &source.array,
            ArraySource::Records(source) => &source.array,
        }
    }
}

impl ChangeSource for ArraySource {
    type Change = Vec<Splice>;

    fn sync(&mut self, hard: bool) {
        match self {
            ArraySource::Polling(source) => source.sync(hard),
            ArraySource::Records(source) => source.sync(hard),
        }
    }

    fn check(&mut self) -> Option<Vec<Splice>> {
        match self {
            ArraySource::Polling(source) => source.check(),
            ArraySource::Records(source) => source.check(),
        }
    }

    fn disconnect(&mut self) {
        match self {
            ArraySource::Polling(source) => source.disconnect(),
            ArraySource::Records(source) => source.disconnect(),
        }
    }
}

/// Observes an array, reporting the minimal splices since the last report.
pub type ArrayObserver = Observer<ArraySource>;

impl Observer<ArraySource> {
    /// # Errors
    ///
    /// Returns [`ObserverError::NotAnArray`] unless `array` is an array.
    pub fn new<F>(scheduler: &Scheduler, array: &Value, callback: F) -> Result<Self, ObserverError>
    where
        F: FnMut(&Vec<Splice>, &Value) -> Result<(), BoxError> + 'static,
    {
        Self::with_token(scheduler, array, callback, Value::Undefined)
    }

    pub fn with_token<F>(scheduler: &Scheduler, array: &Value, callback: F, token: Value) -> Result<Self, ObserverError>
    where
        F: FnMut(&Vec<Splice>, &Value) -> Result<(), BoxError> + 'static,
    {
        let Value::Array(array) = array else {
            return Err(ObserverError::NotAnArray {
                type_name: array.type_name(),
            });
        };
        let source = ArraySource::new(scheduler.strategy(), array.clone());
        Ok(Observer::start(scheduler, source, Box::new(callback), token))
    }

    pub fn array(&self) -> Array {
        self.with_source(|source| source.array().clone())
    }

    /// Replays `splices` on `previous`, taking the added items from
    /// `current`.
    pub fn apply_splices(previous: &mut Vec<Value>, current: &[Value], splices: &[Splice]) {
        splice::apply_splices(previous, current, splices);
    }

    /// Minimal splices turning `previous` into `current`.
    pub fn calculate_splices(current: &[Value], previous: &[Value]) -> Vec<Splice> {
        calculate_splices(current, previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&n| Value::from(n)).collect()
    }

    #[test]
    fn test_polling_and_records_agree() {
        let array = Array::from_vec(nums(&[0, 1, 2, 3, 4]));
        let mut polling = PollingArraySource::new(array.clone());
        let mut records = RecordArraySource::new(array.clone());
        polling.sync(true);
        records.sync(true);

        array.splice(1, 2, nums(&[7, 8, 9]));
        array.set(0, 5);
        array.pop();

        let polled = polling.check().unwrap();
        let projected = records.check().unwrap();

        let mut a = nums(&[0, 1, 2, 3, 4]);
        let mut b = a.clone();
        let current = array.to_vec();
        ArrayObserver::apply_splices(&mut a, &current, &polled);
        ArrayObserver::apply_splices(&mut b, &current, &projected);
        assert_eq!(a, current);
        assert_eq!(b, current);
    }

    #[test]
    fn test_reverted_mutation_reports_nothing() {
        let array = Array::from_vec(nums(&[1, 2]));
        let mut records = RecordArraySource::new(array.clone());
        records.sync(true);
        array.push(3);
        array.pop();
        assert!(records.check().is_none());
    }
}
