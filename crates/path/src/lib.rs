//! Dotted property paths.
//!
//! A [`Path`] is an immutable sequence of property names and indices parsed
//! from a string such as `"a.b.2.c"`. Reading through a path never fails:
//! the walk stops at the first `null`/`undefined` intermediate and yields
//! `undefined`. Writing only happens when every intermediate is reachable.
//!
//! # Example
//!
//! ```
//! use change_summary_model::Value;
//! use change_summary_path::{get_value_at_path, set_value_at_path, Path};
//! use serde_json::json;
//!
//! let doc = Value::from(json!({"a": {"b": [10, 20]}}));
//!
//! let path = Path::parse("a.b.1").unwrap();
//! assert_eq!(path.get_value_from(&doc), Value::from(20));
//! assert_eq!(path.to_string(), "a.b.1");
//!
//! assert!(set_value_at_path(&doc, "a.c", Value::from(true)));
//! assert_eq!(get_value_at_path(&doc, "a.c"), Value::from(true));
//!
//! // Unreachable paths read as undefined and refuse writes.
//! assert_eq!(get_value_at_path(&doc, "x.y.z"), Value::Undefined);
//! assert!(!set_value_at_path(&doc, "x.y.z", Value::Null));
//! ```

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use change_summary_model::Value;
use thiserror::Error;

pub mod cache;
pub use cache::{get_path, PathCache};

pub mod types;
pub use types::PathSegment;

pub mod validate;
pub use validate::{is_path_valid, strip_whitespace, validate_path};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path: {path:?}")]
    Invalid { path: String },
}

/// A parsed, immutable property path. Clones share the segment storage.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Rc<[PathSegment]>,
}

impl Path {
    /// The zero-length path, denoting the root value itself.
    pub fn root() -> Self {
        Self {
            segments: Rc::from(Vec::new()),
        }
    }

    /// Parse a dotted path string. Whitespace anywhere is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invalid`] when [`is_path_valid`] rejects `path`.
    ///
    /// # Example
    ///
    /// ```
    /// use change_summary_path::{Path, PathSegment};
    ///
    /// let path = Path::parse("items.0.name").unwrap();
    /// assert_eq!(
    ///     path.segments(),
    ///     &[
    ///         PathSegment::Key("items".into()),
    ///         PathSegment::Index(0),
    ///         PathSegment::Key("name".into()),
    ///     ]
    /// );
    /// assert!(Path::parse("").unwrap().is_empty());
    /// assert!(Path::parse("items[0]").is_err());
    /// ```
    pub fn parse(path: &str) -> Result<Self, PathError> {
        validate_path(path)?;
        let compact = strip_whitespace(path);
        if compact.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<PathSegment> = compact.split('.').map(PathSegment::parse).collect();
        Ok(Self {
            segments: Rc::from(segments),
        })
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self {
            segments: Rc::from(segments),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `true` when both handles share the same parsed storage.
    pub fn ptr_eq(&self, other: &Path) -> bool {
        Rc::ptr_eq(&self.segments, &other.segments)
    }

    /// Resolve the path against `root`.
    ///
    /// Returns `root` itself for the zero-length path and `Undefined` as
    /// soon as an intermediate value is `null` or `undefined`.
    pub fn get_value_from(&self, root: &Value) -> Value {
        let mut current = root.clone();
        for segment in self.segments.iter() {
            if current.is_nullish() {
                return Value::Undefined;
            }
            current = segment.read(&current);
        }
        current
    }

    /// Like [`get_value_from`](Self::get_value_from), reporting every value
    /// the walk reads a property of (the root and each intermediate) to
    /// `observe`. The final value is not reported.
    pub fn get_value_from_observed<F>(&self, root: &Value, mut observe: F) -> Value
    where
        F: FnMut(&Value),
    {
        let mut current = root.clone();
        for segment in self.segments.iter() {
            if current.is_nullish() {
                return Value::Undefined;
            }
            observe(&current);
            current = segment.read(&current);
        }
        current
    }

    /// Assign `value` at the path below `root`.
    ///
    /// Returns `false` without side effects for the zero-length path, when
    /// an intermediate is `null`/`undefined`, or when the final container
    /// cannot hold the property.
    pub fn set_value_from(&self, root: &Value, value: Value) -> bool {
        let Some((last, parents)) = self.segments.split_last() else {
            return false;
        };
        let mut current = root.clone();
        for segment in parents {
            if current.is_nullish() {
                return false;
            }
            current = segment.read(&current);
        }
        if current.is_nullish() {
            return false;
        }
        last.write(&current, value)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.to_string())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<&str> for Path {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Path::parse(s)
    }
}

/// Read `path` below `root`; an invalid path string reads as `Undefined`.
/// The string is parsed through [`get_path`].
pub fn get_value_at_path(root: &Value, path: &str) -> Value {
    match get_path(path) {
        Ok(path) => path.get_value_from(root),
        Err(_) => Value::Undefined,
    }
}

/// Write `value` at `path` below `root`; an invalid path string is a no-op
/// returning `false`. The string is parsed through [`get_path`].
pub fn set_value_at_path(root: &Value, path: &str, value: Value) -> bool {
    match get_path(path) {
        Ok(path) => path.set_value_from(root, value),
        Err(_) => false,
    }
}
