use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::equal::same_value;
use crate::record::{ChangeRecord, RecordQueue, Watchers};
use crate::value::Value;

#[derive(Default)]
struct ArrayNode {
    items: RefCell<Vec<Value>>,
    watchers: Watchers,
}

/// A shared, growable sequence of values.
///
/// Holes (slots created by growing the array or by [`Array::delete`]) are
/// `Value::Undefined`. Structural mutations report
/// [`ChangeRecord::Splice`]; replacing an existing slot reports
/// [`ChangeRecord::Updated`].
///
/// # Example
///
/// ```
/// use change_summary_model::{Array, Value};
///
/// let arr = Array::from_vec(vec![1.into(), 2.into(), 3.into()]);
/// let removed = arr.splice(1, 1, vec![9.into(), 9.into()]);
/// assert_eq!(removed, vec![Value::from(2)]);
/// assert_eq!(arr.to_vec(), vec![1.into(), 9.into(), 9.into(), Value::from(3)]);
/// ```
#[derive(Clone, Default)]
pub struct Array(Rc<ArrayNode>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Array(Rc::new(ArrayNode {
            items: RefCell::new(items),
            watchers: Watchers::default(),
        }))
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    /// Element at `index`; `Undefined` past the end.
    pub fn get(&self, index: usize) -> Value {
        self.0.items.borrow().get(index).cloned().unwrap_or_default()
    }

    /// A shallow copy of the current elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    /// Runs `f` over the current elements without copying them.
    pub fn with_items<R>(&self, f: impl FnOnce(&[Value]) -> R) -> R {
        f(&self.0.items.borrow())
    }

    /// Assigns slot `index`, growing the array with holes when `index` is
    /// past the end.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let value = value.into();
        let record = {
            let mut items = self.0.items.borrow_mut();
            if index < items.len() {
                if same_value(&items[index], &value) {
                    return;
                }
                let old_value = std::mem::replace(&mut items[index], value);
                ChangeRecord::Updated {
                    name: index.to_string(),
                    old_value,
                }
            } else {
                let from = items.len();
                items.resize(index, Value::Undefined);
                items.push(value);
                ChangeRecord::Splice {
                    index: from,
                    removed: Vec::new(),
                    added_count: index + 1 - from,
                }
            }
        };
        self.0.watchers.notify(record);
    }

    /// Turns slot `index` into a hole, returning the previous value. Holes
    /// and out-of-range indices are left alone.
    pub fn delete(&self, index: usize) -> Option<Value> {
        let old_value = {
            let mut items = self.0.items.borrow_mut();
            match items.get_mut(index) {
                Some(slot) if !slot.is_undefined() => std::mem::take(slot),
                _ => return None,
            }
        };
        self.0.watchers.notify(ChangeRecord::Deleted {
            name: index.to_string(),
            old_value: old_value.clone(),
        });
        Some(old_value)
    }

    /// Appends `value`, returning the new length.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        let index = {
            let mut items = self.0.items.borrow_mut();
            items.push(value.into());
            items.len() - 1
        };
        self.0.watchers.notify(ChangeRecord::Splice {
            index,
            removed: Vec::new(),
            added_count: 1,
        });
        index + 1
    }

    pub fn pop(&self) -> Option<Value> {
        let (index, value) = {
            let mut items = self.0.items.borrow_mut();
            let value = items.pop()?;
            (items.len(), value)
        };
        self.0.watchers.notify(ChangeRecord::Splice {
            index,
            removed: vec![value.clone()],
            added_count: 0,
        });
        Some(value)
    }

    pub fn shift(&self) -> Option<Value> {
        let value = {
            let mut items = self.0.items.borrow_mut();
            if items.is_empty() {
                return None;
            }
            items.remove(0)
        };
        self.0.watchers.notify(ChangeRecord::Splice {
            index: 0,
            removed: vec![value.clone()],
            added_count: 0,
        });
        Some(value)
    }

    /// Prepends `values`, returning the new length.
    pub fn unshift(&self, values: Vec<Value>) -> usize {
        let added_count = values.len();
        let len = {
            let mut items = self.0.items.borrow_mut();
            items.splice(0..0, values);
            items.len()
        };
        if added_count > 0 {
            self.0.watchers.notify(ChangeRecord::Splice {
                index: 0,
                removed: Vec::new(),
                added_count,
            });
        }
        len
    }

    /// Removes `delete_count` elements at `start` and inserts `values` in
    /// their place, returning the removed elements.
    ///
    /// A negative `start` counts back from the end; `start` and
    /// `delete_count` are clamped to the array bounds.
    pub fn splice(&self, start: isize, delete_count: usize, values: Vec<Value>) -> Vec<Value> {
        let added_count = values.len();
        let (index, removed) = {
            let mut items = self.0.items.borrow_mut();
            let len = items.len();
            let start = if start < 0 {
                len.saturating_sub(start.unsigned_abs())
            } else {
                (start as usize).min(len)
            };
            let end = start + delete_count.min(len - start);
            let removed: Vec<Value> = items.splice(start..end, values).collect();
            (start, removed)
        };
        if !removed.is_empty() || added_count > 0 {
            self.0.watchers.notify(ChangeRecord::Splice {
                index,
                removed: removed.clone(),
                added_count,
            });
        }
        removed
    }

    /// Truncates, or extends with holes, to `len`.
    pub fn set_len(&self, len: usize) {
        let record = {
            let mut items = self.0.items.borrow_mut();
            let old_len = items.len();
            if len < old_len {
                ChangeRecord::Splice {
                    index: len,
                    removed: items.split_off(len),
                    added_count: 0,
                }
            } else if len > old_len {
                items.resize(len, Value::Undefined);
                ChangeRecord::Splice {
                    index: old_len,
                    removed: Vec::new(),
                    added_count: len - old_len,
                }
            } else {
                return;
            }
        };
        self.0.watchers.notify(record);
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn watch(&self, queue: &Rc<RecordQueue>) -> bool {
        self.0.watchers.add(queue)
    }

    pub fn unwatch(&self, queue: &Rc<RecordQueue>) -> bool {
        self.0.watchers.remove(queue)
    }

    /// Number of live queues subscribed to this array.
    pub fn watcher_count(&self) -> usize {
        self.0.watchers.len()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => f.debug_list().entries(items.iter()).finish(),
            Err(_) => f.write_str("[<borrowed>]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[i32]) -> Vec<Value> {
        values.iter().map(|&n| Value::from(n)).collect()
    }

    fn watched(values: &[i32]) -> (Array, Rc<RecordQueue>) {
        let arr = Array::from_vec(nums(values));
        let queue = RecordQueue::new();
        arr.watch(&queue);
        (arr, queue)
    }

    #[test]
    fn test_splice_clamps_like_js() {
        let (arr, queue) = watched(&[0, 1]);
        assert!(arr.splice(0, 0, vec![]).is_empty());
        assert!(queue.is_empty());

        let removed = arr.splice(-1, 0, nums(&[5]));
        assert!(removed.is_empty());
        assert_eq!(arr.to_vec(), nums(&[0, 5, 1]));

        let removed = arr.splice(1, 10, vec![]);
        assert_eq!(removed, nums(&[5, 1]));
        assert_eq!(arr.to_vec(), nums(&[0]));

        let removed = arr.splice(-10, 1, vec![]);
        assert_eq!(removed, nums(&[0]));
        assert!(arr.is_empty());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_set_past_end_grows_with_holes() {
        let (arr, queue) = watched(&[0]);
        arr.set(3, 7);
        assert_eq!(
            arr.to_vec(),
            vec![0.into(), Value::Undefined, Value::Undefined, 7.into()]
        );
        assert_eq!(
            queue.take(),
            vec![ChangeRecord::Splice {
                index: 1,
                removed: vec![],
                added_count: 3
            }]
        );
    }

    #[test]
    fn test_set_existing_records_update() {
        let (arr, queue) = watched(&[0, 1]);
        arr.set(1, 1);
        assert!(queue.is_empty());
        arr.set(1, 2);
        assert_eq!(
            queue.take(),
            vec![ChangeRecord::Updated {
                name: "1".into(),
                old_value: 1.into()
            }]
        );
    }

    #[test]
    fn test_delete_leaves_hole() {
        let (arr, queue) = watched(&[0, 1, 2]);
        assert_eq!(arr.delete(1), Some(Value::from(1)));
        assert_eq!(arr.delete(1), None);
        assert_eq!(arr.delete(9), None);
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(1), Value::Undefined);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_stack_operations() {
        let (arr, queue) = watched(&[0, 1]);
        assert_eq!(arr.push(2), 3);
        assert_eq!(arr.pop(), Some(Value::from(2)));
        assert_eq!(arr.shift(), Some(Value::from(0)));
        assert_eq!(arr.unshift(nums(&[-2, -1])), 3);
        assert_eq!(arr.unshift(vec![]), 3);
        assert_eq!(arr.to_vec(), nums(&[-2, -1, 1]));
        assert_eq!(queue.len(), 4);

        arr.set_len(0);
        assert_eq!(arr.pop(), None);
        assert_eq!(arr.shift(), None);
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn test_set_len() {
        let (arr, queue) = watched(&[0, 1, 2]);
        arr.set_len(3);
        assert!(queue.is_empty());
        arr.set_len(1);
        arr.set_len(2);
        assert_eq!(
            queue.take(),
            vec![
                ChangeRecord::Splice {
                    index: 1,
                    removed: nums(&[1, 2]),
                    added_count: 0
                },
                ChangeRecord::Splice {
                    index: 1,
                    removed: vec![],
                    added_count: 1
                },
            ]
        );
    }
}
