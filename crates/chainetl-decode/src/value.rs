//! The decoder's output value type.

use serde_json::Value;
use std::fmt;

/// A decoded parameter value.
///
/// Integers of every width are carried as base-10 strings so the full
/// 256-bit range survives without a bignum type in the public surface;
/// downstream sinks treat `args` as schemaless text anyway.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// Signed or unsigned integer as a decimal string, `-`-prefixed when
    /// negative.
    Dec(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Str(String),
    List(Vec<DecodedValue>),
    /// Tuple fields in declaration order.
    Map(Vec<(String, DecodedValue)>),
}

impl DecodedValue {
    /// JSON form: integers stay strings, bytes render as `0x…` hex, tuples
    /// become objects.
    pub fn to_json(&self) -> Value {
        match self {
            DecodedValue::Dec(s) => Value::String(s.clone()),
            DecodedValue::Bool(b) => Value::Bool(*b),
            DecodedValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
            DecodedValue::Str(s) => Value::String(s.clone()),
            DecodedValue::List(items) => {
                Value::Array(items.iter().map(DecodedValue::to_json).collect())
            }
            DecodedValue::Map(fields) => {
                let mut map = serde_json::Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }

    /// Returns the inner string for `Dec` and `Str` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::Dec(s) | DecodedValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Dec(s) => write!(f, "{s}"),
            DecodedValue::Bool(b) => write!(f, "{b}"),
            DecodedValue::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            DecodedValue::Str(s) => write!(f, "{s}"),
            DecodedValue::List(items) => {
                let parts: Vec<_> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            DecodedValue::Map(fields) => {
                let parts: Vec<_> = fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_forms() {
        assert_eq!(DecodedValue::Dec("100000".into()).to_json(), "100000");
        assert_eq!(DecodedValue::Bool(true).to_json(), true);
        assert_eq!(DecodedValue::Bytes(vec![0xab, 0xcd]).to_json(), "0xabcd");
        let list = DecodedValue::List(vec![
            DecodedValue::Dec("1".into()),
            DecodedValue::Dec("2".into()),
        ]);
        assert_eq!(list.to_json(), serde_json::json!(["1", "2"]));
    }

    #[test]
    fn map_preserves_field_order() {
        let map = DecodedValue::Map(vec![
            ("zebra".into(), DecodedValue::Bool(true)),
            ("apple".into(), DecodedValue::Bool(false)),
        ]);
        let json = map.to_json().to_string();
        assert!(json.find("zebra").unwrap() < json.find("apple").unwrap());
    }
}
