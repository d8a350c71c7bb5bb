//! Mutation change records and the queues that collect them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::value::Value;

/// A single mutation reported by an [`Object`](crate::Object) or
/// [`Array`](crate::Array).
///
/// Property records carry the property name as a string; array index
/// assignments use the decimal index as the name.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeRecord {
    /// A property that did not exist was created.
    New { name: String },
    /// An existing property was assigned a different value.
    Updated { name: String, old_value: Value },
    /// A property was removed (or an array slot turned into a hole).
    Deleted { name: String, old_value: Value },
    /// A structural array mutation.
    Splice {
        index: usize,
        removed: Vec<Value>,
        added_count: usize,
    },
}

impl ChangeRecord {
    /// The property name for `New`/`Updated`/`Deleted`, `None` for splices.
    pub fn name(&self) -> Option<&str> {
        match self {
            ChangeRecord::New { name }
            | ChangeRecord::Updated { name, .. }
            | ChangeRecord::Deleted { name, .. } => Some(name),
            ChangeRecord::Splice { .. } => None,
        }
    }

    /// The value the property held before the mutation, if the record has one.
    pub fn old_value(&self) -> Option<&Value> {
        match self {
            ChangeRecord::Updated { old_value, .. } | ChangeRecord::Deleted { old_value, .. } => {
                Some(old_value)
            }
            _ => None,
        }
    }
}

/// A mailbox of change records.
///
/// Objects and arrays hold their queues weakly: dropping the last `Rc` to a
/// queue unsubscribes it from everything it was watching.
#[derive(Debug, Default)]
pub struct RecordQueue {
    records: RefCell<Vec<ChangeRecord>>,
}

impl RecordQueue {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn push(&self, record: ChangeRecord) {
        self.records.borrow_mut().push(record);
    }

    /// Drains every queued record, oldest first.
    pub fn take(&self) -> Vec<ChangeRecord> {
        std::mem::take(&mut *self.records.borrow_mut())
    }

    /// Discards every queued record.
    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }
}

/// The set of queues subscribed to one object or array.
#[derive(Debug, Default)]
pub(crate) struct Watchers {
    queues: RefCell<Vec<Weak<RecordQueue>>>,
}

impl Watchers {
    pub(crate) fn add(&self, queue: &Rc<RecordQueue>) -> bool {
        let mut queues = self.queues.borrow_mut();
        queues.retain(|w| w.strong_count() > 0);
        if queues.iter().any(|w| std::ptr::eq(w.as_ptr(), Rc::as_ptr(queue))) {
            return false;
        }
        queues.push(Rc::downgrade(queue));
        true
    }

    pub(crate) fn remove(&self, queue: &Rc<RecordQueue>) -> bool {
        let mut queues = self.queues.borrow_mut();
        let before = queues.len();
        queues.retain(|w| w.strong_count() > 0 && !std::ptr::eq(w.as_ptr(), Rc::as_ptr(queue)));
        queues.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.queues
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Delivers `record` to every live queue. Must not be called while the
    /// owning node's contents are borrowed.
    pub(crate) fn notify(&self, record: ChangeRecord) {
        let live: Vec<Rc<RecordQueue>> = {
            let mut queues = self.queues.borrow_mut();
            queues.retain(|w| w.strong_count() > 0);
            queues.iter().filter_map(Weak::upgrade).collect()
        };
        for queue in live {
            queue.push(record.clone());
        }
    }
}
