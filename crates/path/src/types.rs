//! Type definitions for property paths.

use std::borrow::Cow;
use std::fmt;

use change_summary_model::{index_key, Value};

/// One step of a [`Path`](crate::Path).
///
/// Canonical decimal strings (`"0"`, `"12"`) parse as indices; every other
/// identifier is a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn parse(segment: &str) -> Self {
        match index_key(segment) {
            Some(index) => PathSegment::Index(index),
            None => PathSegment::Key(segment.to_string()),
        }
    }

    /// The segment as a property name.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Key(key) => Cow::Borrowed(key),
            PathSegment::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    /// Reads this property of `value`.
    pub fn read(&self, value: &Value) -> Value {
        match self {
            PathSegment::Key(key) => value.get_property(key),
            PathSegment::Index(index) => value.get_index(*index),
        }
    }

    /// Assigns this property of `value`, returning whether it happened.
    pub fn write(&self, target: &Value, value: Value) -> bool {
        match self {
            PathSegment::Key(key) => target.set_property(key, value),
            PathSegment::Index(index) => target.set_index(*index, value),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segment() {
        assert_eq!(PathSegment::parse("0"), PathSegment::Index(0));
        assert_eq!(PathSegment::parse("10"), PathSegment::Index(10));
        assert_eq!(PathSegment::parse("foo"), PathSegment::Key("foo".into()));
        assert_eq!(PathSegment::parse("$x1"), PathSegment::Key("$x1".into()));
    }

    #[test]
    fn test_as_key() {
        assert_eq!(PathSegment::Index(3).as_key(), "3");
        assert_eq!(PathSegment::Key("a".into()).as_key(), "a");
    }

    #[test]
    fn test_read_write_through_segment() {
        let obj = Value::object([("a", 1)]);
        let key = PathSegment::parse("a");
        assert_eq!(key.read(&obj), Value::from(1));
        assert!(key.write(&obj, Value::from(2)));
        assert_eq!(key.read(&obj), Value::from(2));

        let arr = Value::array([10, 20]);
        let idx = PathSegment::Index(1);
        assert_eq!(idx.read(&arr), Value::from(20));
        assert!(!idx.write(&Value::from("str"), Value::Null));
    }
}
