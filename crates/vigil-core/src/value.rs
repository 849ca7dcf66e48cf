//! Dynamic value trees
//!
//! [`DynamicValue`] is the explicit, JSON-like value model that scenario
//! fixtures use when talking to structured stores. Maps are keyed by string
//! and compare without regard to insertion order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// String-keyed map of dynamic values
pub type DynamicMap = BTreeMap<String, DynamicValue>;

/// A recursive, dynamically-typed value
///
/// Equality is structural. `Number` uses IEEE-754 comparison, so a `NaN`
/// never equals itself; the codec refuses to encode non-finite numbers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    /// Explicit null
    #[default]
    Null,
    /// UTF-8 string
    String(String),
    /// Double-precision number
    Number(f64),
    /// Boolean
    Boolean(bool),
    /// Ordered list
    List(Vec<DynamicValue>),
    /// Unordered string-keyed map
    Map(DynamicMap),
}

impl DynamicValue {
    /// Short name of the runtime type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            DynamicValue::Null => "null",
            DynamicValue::String(_) => "string",
            DynamicValue::Number(_) => "number",
            DynamicValue::Boolean(_) => "boolean",
            DynamicValue::List(_) => "list",
            DynamicValue::Map(_) => "map",
        }
    }

    /// Whether this value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the list payload
    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the map payload
    pub fn as_map(&self) -> Option<&DynamicMap> {
        match self {
            DynamicValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Whether every entry of `expected` is present here with an equal value.
    ///
    /// Maps are compared recursively by subset; every other type must be
    /// equal. Used by scenario assertions that only pin some fields.
    pub fn contains(&self, expected: &DynamicValue) -> bool {
        match (self, expected) {
            (DynamicValue::Map(actual), DynamicValue::Map(expected)) => {
                expected.iter().all(|(key, want)| {
                    actual
                        .get(key)
                        .map(|have| have.contains(want))
                        .unwrap_or(false)
                })
            }
            (actual, expected) => actual == expected,
        }
    }

    /// Convert into a JSON value.
    ///
    /// Integral numbers inside the `i64` range become JSON integers.
    /// Non-finite numbers have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DynamicValue::Null => serde_json::Value::Null,
            DynamicValue::String(s) => serde_json::Value::String(s.clone()),
            DynamicValue::Number(n) => number_to_json(*n),
            DynamicValue::Boolean(b) => serde_json::Value::Bool(*b),
            DynamicValue::List(items) => {
                serde_json::Value::Array(items.iter().map(DynamicValue::to_json).collect())
            }
            DynamicValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    // 2^53: every integer below this is exactly representable
    const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < EXACT_INT_LIMIT {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl From<serde_json::Value> for DynamicValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DynamicValue::Null,
            serde_json::Value::Bool(b) => DynamicValue::Boolean(b),
            serde_json::Value::Number(n) => DynamicValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => DynamicValue::String(s),
            serde_json::Value::Array(items) => {
                DynamicValue::List(items.into_iter().map(DynamicValue::from).collect())
            }
            serde_json::Value::Object(map) => DynamicValue::Map(
                map.into_iter()
                    .map(|(key, value)| (key, DynamicValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        DynamicValue::String(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        DynamicValue::String(value)
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        DynamicValue::Number(value)
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        DynamicValue::Number(value as f64)
    }
}

impl From<i32> for DynamicValue {
    fn from(value: i32) -> Self {
        DynamicValue::Number(f64::from(value))
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        DynamicValue::Boolean(value)
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(value: Vec<DynamicValue>) -> Self {
        DynamicValue::List(value)
    }
}

impl From<DynamicMap> for DynamicValue {
    fn from(value: DynamicMap) -> Self {
        DynamicValue::Map(value)
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DynamicValue::Null)
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(DynamicValue::from)
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_conversion_preserves_structure() {
        let value = DynamicValue::from(json!({
            "id": "order-1",
            "total": 12.5,
            "paid": true,
            "notes": null,
            "lines": [1, 2, 3]
        }));

        assert_eq!(value.get("id").and_then(DynamicValue::as_str), Some("order-1"));
        assert_eq!(value.get("total").and_then(DynamicValue::as_f64), Some(12.5));
        assert_eq!(value.get("paid").and_then(DynamicValue::as_bool), Some(true));
        assert!(value.get("notes").map(DynamicValue::is_null).unwrap_or(false));
        assert_eq!(value.get("lines").and_then(DynamicValue::as_list).map(<[_]>::len), Some(3));
    }

    #[test]
    fn map_equality_ignores_insertion_order() {
        let a = DynamicValue::from(json!({"a": 1, "b": 2}));
        let b = DynamicValue::from(json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn integral_numbers_render_as_integers() {
        assert_eq!(DynamicValue::Number(42.0).to_json(), json!(42));
        assert_eq!(DynamicValue::Number(0.25).to_json(), json!(0.25));
        assert_eq!(DynamicValue::Number(f64::NAN).to_json(), json!(null));
    }

    #[test]
    fn contains_matches_map_subsets() {
        let item = DynamicValue::from(json!({"id": "1", "name": "widget", "meta": {"color": "red", "size": 3}}));
        assert!(item.contains(&DynamicValue::from(json!({"name": "widget"}))));
        assert!(item.contains(&DynamicValue::from(json!({"meta": {"color": "red"}}))));
        assert!(!item.contains(&DynamicValue::from(json!({"name": "gadget"}))));
        assert!(!item.contains(&DynamicValue::from(json!({"missing": true}))));
    }

    #[test]
    fn deserializes_from_toml() {
        let value: DynamicValue = toml::from_str("id = \"x\"\ncount = 3\nflags = [true, false]").unwrap();
        assert_eq!(value.get("count"), Some(&DynamicValue::Number(3.0)));
        assert_eq!(
            value.get("flags"),
            Some(&DynamicValue::List(vec![true.into(), false.into()]))
        );
    }
}
