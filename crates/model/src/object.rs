use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::equal::same_value;
use crate::record::{ChangeRecord, RecordQueue, Watchers};
use crate::value::Value;

#[derive(Default)]
struct ObjectNode {
    props: RefCell<IndexMap<String, Value>>,
    watchers: Watchers,
}

/// A shared, insertion-ordered property map.
///
/// Cloning the handle aliases the same object. A property explicitly set to
/// `Undefined` is still present (`has` returns `true`).
///
/// # Example
///
/// ```
/// use change_summary_model::{Object, Value};
///
/// let obj = Object::new();
/// obj.set("foo", 1);
/// let alias = obj.clone();
/// alias.set("foo", 2);
/// assert_eq!(obj.get("foo"), Value::from(2));
/// assert_eq!(obj.delete("foo"), Some(Value::from(2)));
/// assert!(!obj.has("foo"));
/// ```
#[derive(Clone, Default)]
pub struct Object(Rc<ObjectNode>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let props = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Object(Rc::new(ObjectNode {
            props: RefCell::new(props),
            watchers: Watchers::default(),
        }))
    }

    pub fn get(&self, key: &str) -> Value {
        self.0.props.borrow().get(key).cloned().unwrap_or_default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.props.borrow().contains_key(key)
    }

    /// Assigns `key`. Writing a value that is same-value with the current
    /// one is a no-op and produces no record.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let record = {
            let mut props = self.0.props.borrow_mut();
            match props.get_mut(&key) {
                Some(slot) => {
                    if same_value(slot, &value) {
                        return;
                    }
                    let old_value = std::mem::replace(slot, value);
                    ChangeRecord::Updated {
                        name: key,
                        old_value,
                    }
                }
                None => {
                    props.insert(key.clone(), value);
                    ChangeRecord::New { name: key }
                }
            }
        };
        self.0.watchers.notify(record);
    }

    /// Removes `key`, returning its previous value.
    pub fn delete(&self, key: &str) -> Option<Value> {
        let old_value = self.0.props.borrow_mut().shift_remove(key)?;
        self.0.watchers.notify(ChangeRecord::Deleted {
            name: key.to_string(),
            old_value: old_value.clone(),
        });
        Some(old_value)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.props.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.props.borrow().is_empty()
    }

    /// A shallow copy of the current properties.
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.0.props.borrow().clone()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn watch(&self, queue: &Rc<RecordQueue>) -> bool {
        self.0.watchers.add(queue)
    }

    pub fn unwatch(&self, queue: &Rc<RecordQueue>) -> bool {
        self.0.watchers.remove(queue)
    }

    /// Number of live queues subscribed to this object.
    pub fn watcher_count(&self) -> usize {
        self.0.watchers.len()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.props.try_borrow() {
            Ok(props) => f.debug_map().entries(props.iter()).finish(),
            Err(_) => f.write_str("{<borrowed>}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_records_new_then_updated() {
        let obj = Object::new();
        let queue = RecordQueue::new();
        obj.watch(&queue);

        obj.set("a", 1);
        obj.set("a", 2);
        obj.set("a", 2);

        assert_eq!(
            queue.take(),
            vec![
                ChangeRecord::New { name: "a".into() },
                ChangeRecord::Updated {
                    name: "a".into(),
                    old_value: Value::from(1)
                },
            ]
        );
    }

    #[test]
    fn test_delete_records_old_value() {
        let obj = Object::from_entries([("a", 1)]);
        let queue = RecordQueue::new();
        obj.watch(&queue);

        assert_eq!(obj.delete("missing"), None);
        assert_eq!(obj.delete("a"), Some(Value::from(1)));
        assert_eq!(
            queue.take(),
            vec![ChangeRecord::Deleted {
                name: "a".into(),
                old_value: Value::from(1)
            }]
        );
    }

    #[test]
    fn test_undefined_property_is_present() {
        let obj = Object::new();
        obj.set("x", Value::Undefined);
        assert!(obj.has("x"));
        assert_eq!(obj.get("x"), Value::Undefined);
        assert_eq!(obj.keys(), vec!["x".to_string()]);
    }

    #[test]
    fn test_nan_write_is_same_value() {
        let obj = Object::from_entries([("n", f64::NAN)]);
        let queue = RecordQueue::new();
        obj.watch(&queue);
        obj.set("n", f64::NAN);
        assert!(queue.is_empty());
        obj.set("n", 0.0);
        obj.set("n", -0.0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_unwatch_stops_records() {
        let obj = Object::new();
        let queue = RecordQueue::new();
        obj.watch(&queue);
        assert_eq!(obj.watcher_count(), 1);
        obj.unwatch(&queue);
        obj.set("a", 1);
        assert!(queue.is_empty());
        assert_eq!(obj.watcher_count(), 0);
    }
}
