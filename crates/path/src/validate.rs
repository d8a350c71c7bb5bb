//! Validation of dotted path strings.

use std::sync::OnceLock;

use crate::PathError;

fn path_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(
            r"^(?:[$_a-zA-Z][$_a-zA-Z0-9]*|0|[1-9][0-9]*)(?:\.(?:[$_a-zA-Z][$_a-zA-Z0-9]*|0|[1-9][0-9]*))*$",
        )
        .unwrap()
    })
}

/// Removes every whitespace character; paths are whitespace-insensitive.
pub fn strip_whitespace(path: &str) -> String {
    path.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Check whether `path` is a valid dotted path.
///
/// The empty string (after whitespace removal) is the root path. Otherwise
/// every segment must be an identifier (`[$_a-zA-Z][$_a-zA-Z0-9]*`) or an
/// index without leading zeros.
///
/// # Example
///
/// ```
/// use change_summary_path::is_path_valid;
///
/// assert!(is_path_valid(""));
/// assert!(is_path_valid("a.b.2.c"));
/// assert!(is_path_valid(" a . b "));
/// assert!(!is_path_valid(".a"));
/// assert!(!is_path_valid("a/3!"));
/// assert!(!is_path_valid("a.01"));
/// ```
pub fn is_path_valid(path: &str) -> bool {
    let compact = strip_whitespace(path);
    compact.is_empty() || path_regex().is_match(&compact)
}

/// Validate a dotted path string.
///
/// # Errors
///
/// Returns [`PathError::Invalid`] if [`is_path_valid`] rejects it.
pub fn validate_path(path: &str) -> Result<(), PathError> {
    if is_path_valid(path) {
        Ok(())
    } else {
        Err(PathError::Invalid {
            path: path.to_string(),
        })
    }
}
