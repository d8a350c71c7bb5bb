//! Equality relations over [`Value`].

use crate::value::Value;

/// Same-value comparison (`Object.is`): like strict equality, except that
/// `NaN` equals `NaN` and `+0` differs from `-0`.
///
/// # Examples
///
/// ```
/// use change_summary_model::{same_value, Value};
///
/// assert!(same_value(&Value::from(f64::NAN), &Value::from(f64::NAN)));
/// assert!(!same_value(&Value::from(0.0), &Value::from(-0.0)));
/// assert!(same_value(&Value::from("a"), &Value::from("a")));
/// ```
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                return true;
            }
            x == y && x.is_sign_negative() == y.is_sign_negative()
        }
        _ => a == b,
    }
}

/// Strict equality (`===`). Equivalent to `a == b`.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    a == b
}

/// Structural equality.
///
/// Arrays compare element by element and objects key by key (order
/// insensitive); numbers compare like strict equality except that `NaN`
/// equals `NaN`. Not safe on cyclic graphs.
///
/// # Examples
///
/// ```
/// use change_summary_model::{deep_equal, Value};
///
/// let a = Value::object([("foo", Value::array([1, 2, 3]))]);
/// let b = Value::object([("foo", Value::array([1, 2, 3]))]);
/// let c = Value::object([("foo", Value::array([1, 2, 4]))]);
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),

        (Value::Array(arr_a), Value::Array(arr_b)) => {
            if arr_a.ptr_eq(arr_b) {
                return true;
            }
            let items_a = arr_a.to_vec();
            let items_b = arr_b.to_vec();
            items_a.len() == items_b.len()
                && items_a
                    .iter()
                    .zip(items_b.iter())
                    .all(|(x, y)| deep_equal(x, y))
        }

        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if obj_a.ptr_eq(obj_b) {
                return true;
            }
            let props_a = obj_a.snapshot();
            let props_b = obj_b.snapshot();
            if props_a.len() != props_b.len() {
                return false;
            }
            for (key, val_a) in &props_a {
                match props_b.get(key) {
                    Some(val_b) => {
                        if !deep_equal(val_a, val_b) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            true
        }

        _ => a == b,
    }
}

/// Element-wise [`deep_equal`] over two slices.
pub fn deep_equal_slices(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
}
