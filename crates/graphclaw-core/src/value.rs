//! Property values: the tagged union every identity and property map holds.
//!
//! Serializes to plain JSON for the storage side: scalars as themselves,
//! bytes as standard base64, lists and maps as arrays and objects.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Identity mapping. Ordered so two runs over the same entity produce the
/// same mapping and the same serialized key.
pub type Identity = BTreeMap<String, Value>;

/// Full property mapping (a superset of [`Identity`]).
pub type Properties = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    /// Finite values only survive a JSON round trip: NaN and infinities
    /// serialize as `null`, which does not deserialize back.
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(b.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// True for the "unset" value of the variant: empty string, zero,
    /// empty collection. Booleans are never default, `false` carries meaning.
    pub fn is_default(&self) -> bool {
        match self {
            Self::String(s) => s.is_empty(),
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Bool(_) => false,
            Self::Bytes(b) => b.is_empty(),
            Self::List(l) => l.is_empty(),
            Self::Map(m) => m.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert from JSON. `null` has no counterpart and yields `None`;
    /// nulls nested in arrays and objects are dropped.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        use serde_json::Value as J;
        match json {
            J::Null => None,
            J::Bool(b) => Some(Self::Bool(b)),
            J::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            J::String(s) => Some(Self::String(s)),
            J::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            J::Object(map) => Some(Self::Map(
                map.into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Bytes(b) => write!(f, "{}", STANDARD.encode(b)),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Bytes(b) => serializer.serialize_str(&STANDARD.encode(b)),
            Self::List(items) => items.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(json).ok_or_else(|| D::Error::custom("null is not a property value"))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i.into())
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Self::Int(i.into())
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i.into())
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        match i64::try_from(i) {
            Ok(i) => Self::Int(i),
            Err(_) => Self::Float(i as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items.into_iter().map(Self::String).collect())
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(Self::from).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_per_variant() {
        assert!(Value::from("").is_default());
        assert!(Value::from(0i64).is_default());
        assert!(Value::from(0.0).is_default());
        assert!(Value::List(vec![]).is_default());
        assert!(Value::bytes(Vec::new()).is_default());
        assert!(!Value::from(false).is_default());
        assert!(!Value::from("x").is_default());
    }

    #[test]
    fn bytes_serialize_as_base64() {
        let v = Value::bytes(b"hi".to_vec());
        assert_eq!(serde_json::to_value(&v).unwrap(), json!("aGk="));
    }

    #[test]
    fn from_json_drops_nulls() {
        let v = Value::from_json(json!({"a": 1, "b": null, "c": [true, null]})).unwrap();
        let Value::Map(map) = v else { panic!("expected map") };
        assert_eq!(map.len(), 2);
        assert_eq!(map["c"], Value::List(vec![Value::Bool(true)]));
        assert!(Value::from_json(json!(null)).is_none());
    }

    #[test]
    fn deserialize_rejects_null() {
        assert!(serde_json::from_str::<Value>("null").is_err());
        assert_eq!(serde_json::from_str::<Value>("2.5").unwrap(), Value::Float(2.5));
    }
}
