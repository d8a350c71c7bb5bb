//! Conversions between [`Value`] and `serde_json`.
//!
//! Building from JSON always creates fresh arrays and objects. Converting back
//! maps `Undefined` and non-finite numbers to `null`.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

use crate::array::Array;
use crate::object::Object;
use crate::value::Value;

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::Array(Array::from_vec(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => {
                Value::Object(Object::from_entries(map.into_iter().map(|(k, v)| (k, Value::from(v)))))
            }
        }
    }
}

/// Integral numbers inside the exactly-representable range (except `-0`).
fn as_safe_integer(n: f64) -> Option<i64> {
    let integral = n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0;
    if integral && !(n == 0.0 && n.is_sign_negative()) {
        Some(n as i64)
    } else {
        None
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if let Some(i) = as_safe_integer(n) {
        return serde_json::Value::Number(Number::from(i));
    }
    Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl Value {
    /// Deep copy into a `serde_json::Value`. Not safe on cyclic graphs.
    ///
    /// # Example
    ///
    /// ```
    /// use change_summary_model::Value;
    /// use serde_json::json;
    ///
    /// let doc = json!({"foo": [1, 2.5, null, "x"]});
    /// let value = Value::from(doc.clone());
    /// assert_eq!(value.to_json(), doc);
    /// assert_eq!(Value::Undefined.to_json(), json!(null));
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.to_vec().iter().map(Value::to_json).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.snapshot()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match as_safe_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None if n.is_finite() => serializer.serialize_f64(*n),
                None => serializer.serialize_unit(),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => arr.serialize(serializer),
            Value::Object(obj) => obj.serialize(serializer),
        }
    }
}

impl Serialize for Array {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let items = self.to_vec();
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in &items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let props = self.snapshot();
        let mut map = serializer.serialize_map(Some(props.len()))?;
        for (key, value) in &props {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equal::deep_equal;
    use serde_json::json;

    #[test]
    fn test_from_json_creates_fresh_identities() {
        let doc = json!({"a": {"b": 1}});
        let x = Value::from(doc.clone());
        let y = Value::from(doc);
        assert_ne!(x.get_property("a"), y.get_property("a"));
        assert!(deep_equal(&x, &y));
    }

    #[test]
    fn test_to_json_numbers() {
        assert_eq!(Value::from(3).to_json(), json!(3));
        assert_eq!(Value::from(2.5).to_json(), json!(2.5));
        assert_eq!(Value::from(f64::NAN).to_json(), json!(null));
        assert_eq!(Value::from(f64::INFINITY).to_json(), json!(null));
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let value = Value::from(json!({"k": [true, "s", null]}));
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"k":[true,"s",null]}"#);
    }

    #[test]
    fn test_serialize_integral_numbers_without_fraction() {
        let value = Value::array([Value::from(2), Value::from(1.5)]);
        assert_eq!(serde_json::to_string(&value).unwrap(), "[2,1.5]");
    }

    #[test]
    fn test_serialize_undefined_as_null() {
        let value = Value::array([Value::Undefined, Value::from(f64::NAN)]);
        assert_eq!(serde_json::to_string(&value).unwrap(), "[null,null]");
    }
}
