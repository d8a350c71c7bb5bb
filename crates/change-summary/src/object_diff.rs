//! Shallow own-property diffs.

use change_summary_model::{index_key, ChangeRecord, Value};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::trace;

/// Own properties of a value at one point in time.
///
/// Objects contribute their properties; arrays contribute every present
/// (non-hole) index plus their `length`. Primitives have no properties.
#[derive(Debug, Clone, Default)]
pub struct PropertySnapshot {
    props: IndexMap<String, Value>,
    length: Option<usize>,
}

impl PropertySnapshot {
    pub fn capture(value: &Value) -> Self {
        match value {
            Value::Object(obj) => Self {
                props: obj.snapshot(),
                length: None,
            },
            Value::Array(arr) => Self {
                props: arr.with_items(|items| {
                    items
                        .iter()
                        .enumerate()
                        .filter(|(_, item)| !item.is_undefined())
                        .map(|(i, item)| (i.to_string(), item.clone()))
                        .collect()
                }),
                length: Some(arr.len()),
            },
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Array length at capture time, `None` for non-arrays.
    pub fn length(&self) -> Option<usize> {
        self.length
    }
}

fn has_own(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(obj) => obj.has(key),
        Value::Array(arr) => index_key(key).is_some_and(|i| !arr.get(i).is_undefined()),
        _ => false,
    }
}

fn own_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(obj) => obj.keys(),
        Value::Array(arr) => arr.with_items(|items| {
            items
                .iter()
                .enumerate()
                .filter(|(_, item)| !item.is_undefined())
                .map(|(i, _)| i.to_string())
                .collect()
        }),
        _ => Vec::new(),
    }
}

/// Added, removed and changed own properties, keyed by property name.
///
/// `removed` maps to `undefined`; `added` and `changed` map to current
/// values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectDiff {
    pub added: IndexMap<String, Value>,
    pub removed: IndexMap<String, Value>,
    pub changed: IndexMap<String, Value>,
    #[serde(skip)]
    old_values: IndexMap<String, Value>,
}

impl ObjectDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Value `key` held before the change, `undefined` if it did not exist.
    pub fn old_value(&self, key: &str) -> Value {
        self.old_values.get(key).cloned().unwrap_or_default()
    }
}

/// Compares `current` against a snapshot of its previous properties.
///
/// # Example
///
/// ```
/// use change_summary::{diff_object_from_old_object, PropertySnapshot};
/// use change_summary_model::Value;
///
/// let obj = Value::object([("a", 1), ("b", 2)]);
/// let before = PropertySnapshot::capture(&obj);
/// obj.set_property("a", Value::from(10));
/// obj.set_property("c", Value::from(3));
///
/// let diff = diff_object_from_old_object(&obj, &before);
/// assert_eq!(diff.changed.get("a"), Some(&Value::from(10)));
/// assert_eq!(diff.added.get("c"), Some(&Value::from(3)));
/// assert_eq!(diff.old_value("a"), Value::from(1));
/// assert!(diff.removed.is_empty());
/// ```
pub fn diff_object_from_old_object(current: &Value, old: &PropertySnapshot) -> ObjectDiff {
    let mut diff = ObjectDiff::default();

    for (prop, old_value) in old.iter() {
        let new_value = current.get_property(prop);
        if !new_value.is_undefined() && new_value == *old_value {
            continue;
        }
        if !has_own(current, prop) {
            diff.removed.insert(prop.to_string(), Value::Undefined);
            continue;
        }
        if new_value != *old_value {
            diff.changed.insert(prop.to_string(), new_value);
        }
    }

    for prop in own_keys(current) {
        if old.contains_key(&prop) {
            continue;
        }
        let value = current.get_property(&prop);
        diff.added.insert(prop, value);
    }

    if let (Value::Array(arr), Some(old_len)) = (current, old.length()) {
        if arr.len() != old_len {
            diff.changed.insert("length".to_string(), Value::from(arr.len()));
        }
    }

    diff.old_values = old.props.clone();
    if let Some(old_len) = old.length() {
        diff.old_values.insert("length".to_string(), Value::from(old_len));
    }
    diff
}

/// Derives a diff from the mutation log of `object`.
///
/// An add followed by a delete of the same property cancels out, as does a
/// delete followed by an add (which then counts as changed if the value
/// differs). Splice records are not property records and are skipped.
pub fn diff_object_from_change_records(object: &Value, records: &[ChangeRecord]) -> ObjectDiff {
    let mut added: IndexMap<String, Value> = IndexMap::new();
    let mut removed: IndexMap<String, Value> = IndexMap::new();
    let mut old_values: IndexMap<String, Value> = IndexMap::new();

    for record in records {
        let Some(name) = record.name() else {
            trace!(?record, "skipping non-property record");
            continue;
        };
        if !old_values.contains_key(name) {
            let old = record.old_value().cloned().unwrap_or_default();
            old_values.insert(name.to_string(), old);
        }
        match record {
            ChangeRecord::Updated { .. } => {}
            ChangeRecord::New { .. } => {
                if removed.shift_remove(name).is_none() {
                    added.insert(name.to_string(), Value::Undefined);
                }
            }
            ChangeRecord::Deleted { .. } => {
                if added.shift_remove(name).is_some() {
                    old_values.shift_remove(name);
                } else {
                    removed.insert(name.to_string(), Value::Undefined);
                }
            }
            ChangeRecord::Splice { .. } => {}
        }
    }

    for (prop, value) in added.iter_mut() {
        *value = object.get_property(prop);
    }

    let mut changed = IndexMap::new();
    for (prop, old) in &old_values {
        if added.contains_key(prop) || removed.contains_key(prop) {
            continue;
        }
        let new_value = object.get_property(prop);
        if *old != new_value {
            changed.insert(prop.clone(), new_value);
        }
    }

    ObjectDiff {
        added,
        removed,
        changed,
        old_values,
    }
}
