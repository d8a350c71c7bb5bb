use std::fmt;
use std::rc::Rc;

use crate::array::Array;
use crate::object::Object;
use crate::record::RecordQueue;

/// A dynamically typed value.
///
/// Primitive variants compare by value; [`Array`] and [`Object`] are shared
/// handles and compare by identity. `PartialEq` is strict equality (`===`):
/// `NaN != NaN` and `0.0 == -0.0`. Use [`same_value`](crate::same_value) for
/// same-value semantics and [`deep_equal`](crate::deep_equal) for structural
/// comparison.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Array),
    Object(Object),
}

/// Parses a canonical array index (`"0"`, `"17"`; not `"01"`, `"-1"`, `"1.5"`).
///
/// # Example
///
/// ```
/// use change_summary_model::index_key;
///
/// assert_eq!(index_key("0"), Some(0));
/// assert_eq!(index_key("42"), Some(42));
/// assert_eq!(index_key("042"), None);
/// assert_eq!(index_key("length"), None);
/// ```
pub fn index_key(key: &str) -> Option<usize> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    key.parse().ok()
}

/// Interprets a `length` assignment: only non-negative integral numbers are
/// valid array lengths.
fn as_length(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64 => {
            Some(*n as usize)
        }
        _ => None,
    }
}

impl Value {
    /// Builds a fresh array value.
    pub fn array<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(Array::from_vec(items.into_iter().map(Into::into).collect()))
    }

    /// Builds a fresh object value from `(key, value)` pairs.
    pub fn object<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(Object::from_entries(entries))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` for `undefined` and `null`, the two values property access
    /// short-circuits on.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// `true` for arrays and objects.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The `typeof`-style name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Reads a named property.
    ///
    /// Objects look the key up; arrays answer `length` and canonical
    /// indices; strings answer `length` (in UTF-16 code units). Everything
    /// else, including a missing key, yields `Undefined`.
    pub fn get_property(&self, key: &str) -> Value {
        match self {
            Value::Object(obj) => obj.get(key),
            Value::Array(arr) => {
                if key == "length" {
                    Value::Number(arr.len() as f64)
                } else {
                    index_key(key).map_or(Value::Undefined, |i| arr.get(i))
                }
            }
            Value::String(s) if key == "length" => Value::Number(s.encode_utf16().count() as f64),
            _ => Value::Undefined,
        }
    }

    /// Reads an indexed property. Objects are indexed by the decimal key.
    pub fn get_index(&self, index: usize) -> Value {
        match self {
            Value::Array(arr) => arr.get(index),
            Value::Object(obj) => obj.get(&index.to_string()),
            _ => Value::Undefined,
        }
    }

    /// Assigns a named property, returning whether the assignment happened.
    ///
    /// Primitives have no assignable properties. Assigning an array's
    /// `length` truncates or extends it; any other non-index key on an
    /// array is rejected.
    pub fn set_property(&self, key: &str, value: Value) -> bool {
        match self {
            Value::Object(obj) => {
                obj.set(key, value);
                true
            }
            Value::Array(arr) => {
                if key == "length" {
                    match as_length(&value) {
                        Some(len) => {
                            arr.set_len(len);
                            true
                        }
                        None => false,
                    }
                } else if let Some(i) = index_key(key) {
                    arr.set(i, value);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Assigns an indexed property, returning whether the assignment happened.
    pub fn set_index(&self, index: usize, value: Value) -> bool {
        match self {
            Value::Array(arr) => {
                arr.set(index, value);
                true
            }
            Value::Object(obj) => {
                obj.set(index.to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// Subscribes `queue` to this value's mutations. Returns `false` for
    /// primitives and for queues that are already subscribed.
    pub fn watch(&self, queue: &Rc<RecordQueue>) -> bool {
        match self {
            Value::Array(arr) => arr.watch(queue),
            Value::Object(obj) => obj.watch(queue),
            _ => false,
        }
    }

    /// Unsubscribes `queue`. Returns whether it was subscribed.
    pub fn unwatch(&self, queue: &Rc<RecordQueue>) -> bool {
        match self {
            Value::Array(arr) => arr.unwatch(queue),
            Value::Object(obj) => obj.unwatch(queue),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(arr) => arr.fmt(f),
            Value::Object(obj) => obj.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Array> for Value {
    fn from(arr: Array) -> Self {
        Value::Array(arr)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from_vec(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Undefined, Into::into)
    }
}
