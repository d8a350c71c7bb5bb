//! A bounded, least-recently-used cache of parsed paths.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::{Path, PathError};

/// Default number of distinct path strings kept parsed.
pub const DEFAULT_CAPACITY: usize = 256;

/// Parses every distinct path string once and hands out shared [`Path`]s.
///
/// Entries are kept in recency order; inserting past `capacity` evicts the
/// least recently used one. Invalid strings are never cached. A capacity of
/// zero disables caching.
///
/// # Example
///
/// ```
/// use change_summary_path::PathCache;
///
/// let mut cache = PathCache::new(2);
/// let a = cache.get("a.b").unwrap();
/// let again = cache.get("a.b").unwrap();
/// assert!(a.ptr_eq(&again));
/// assert!(cache.get("a..b").is_err());
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PathCache {
    capacity: usize,
    entries: IndexMap<String, Path>,
}

impl PathCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::with_capacity(capacity.min(DEFAULT_CAPACITY)),
        }
    }

    /// Returns the cached path for `path`, parsing and caching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invalid`] if `path` is not a valid dotted path.
    pub fn get(&mut self, path: &str) -> Result<Path, PathError> {
        if let Some(cached) = self.entries.shift_remove(path) {
            self.entries.insert(path.to_string(), cached.clone());
            return Ok(cached);
        }
        let parsed = Path::parse(path)?;
        if self.capacity == 0 {
            return Ok(parsed);
        }
        if self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(path.to_string(), parsed.clone());
        Ok(parsed)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

thread_local! {
    static SHARED: RefCell<PathCache> = RefCell::new(PathCache::default());
}

/// Parses `path` through this thread's shared cache.
///
/// # Errors
///
/// Returns [`PathError::Invalid`] if `path` is not a valid dotted path.
pub fn get_path(path: &str) -> Result<Path, PathError> {
    SHARED.with(|cache| cache.borrow_mut().get(path))
}
