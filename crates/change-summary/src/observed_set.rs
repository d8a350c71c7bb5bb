//! Dependency tracking for record-driven path observers.

use std::rc::Rc;

use change_summary_model::{RecordQueue, Value};

/// The containers a path walk read through, each subscribed to one shared
/// queue.
///
/// Every walk starts with [`reset`](Self::reset), which flips the current
/// epoch. [`observe`](Self::observe) marks a container as seen in this epoch
/// (subscribing it if new) and [`cleanup`](Self::cleanup) unsubscribes every
/// container the walk did not reach.
#[derive(Debug)]
pub struct ObservedSet {
    queue: Rc<RecordQueue>,
    entries: Vec<(Value, bool)>,
    epoch: bool,
}

impl ObservedSet {
    pub fn new(queue: Rc<RecordQueue>) -> Self {
        Self {
            queue,
            entries: Vec::new(),
            epoch: true,
        }
    }

    pub fn queue(&self) -> &Rc<RecordQueue> {
        &self.queue
    }

    pub fn reset(&mut self) {
        self.epoch = !self.epoch;
    }

    /// Marks `value` as a dependency. Primitives are ignored.
    pub fn observe(&mut self, value: &Value) {
        if !value.is_container() {
            return;
        }
        let epoch = self.epoch;
        match self.entries.iter_mut().find(|(seen, _)| seen == value) {
            Some(entry) => entry.1 = epoch,
            None => {
                value.watch(&self.queue);
                self.entries.push((value.clone(), epoch));
            }
        }
    }

    /// Unsubscribes containers not observed since the last reset.
    pub fn cleanup(&mut self) {
        let epoch = self.epoch;
        let queue = &self.queue;
        self.entries.retain(|(value, seen)| {
            if *seen == epoch {
                true
            } else {
                value.unwatch(queue);
                false
            }
        });
    }

    /// Unsubscribes everything.
    pub fn clear(&mut self) {
        for (value, _) in self.entries.drain(..) {
            value.unwatch(&self.queue);
        }
        self.queue.clear();
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.entries.iter().any(|(seen, _)| seen == value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for ObservedSet {
    fn drop(&mut self) {
        self.clear();
    }
}
