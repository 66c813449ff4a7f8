//! # Decoded Values
//!
//! [`Value`] is what a successful parameter decode produces. It is a superset of
//! `serde_json::Value`: besides the JSON shapes it can carry byte buffers
//! (`format: byte` / `format: binary`), calendar dates (`format: date`) and
//! instants (`format: date-time`), and it keeps integers apart from floats.
//!
//! Objects are insertion ordered so that a decoded `k1=v1,k2=v2` parameter
//! iterates in the order the client sent it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use indexmap::IndexMap;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null`, or the missing half of an odd `k1,v1,k2` pair list
    Null,
    String(String),
    /// Whole numbers that fit in an `i64`
    Integer(i64),
    Number(f64),
    Boolean(bool),
    /// Raw bytes from `format: byte` (base64) or `format: binary`
    Bytes(Vec<u8>),
    /// Calendar date from `format: date`
    Date(Date),
    /// Instant from `format: date-time`, offset preserved
    DateTime(OffsetDateTime),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Name of the variant, used in log fields and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date-time",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of both `Integer` and `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Render as JSON.
    ///
    /// Bytes become standard base64, dates `YYYY-MM-DD`, instants RFC 3339.
    /// Non-finite floats cannot be represented and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::String(s) => Json::String(s.clone()),
            Value::Integer(i) => Json::from(*i),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Boolean(b) => Json::Bool(*b),
            Value::Bytes(bytes) => Json::String(STANDARD.encode(bytes)),
            Value::Date(date) => Json::String(format_date(*date)),
            Value::DateTime(instant) => Json::String(format_date_time(*instant)),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

pub(crate) fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub(crate) fn format_date_time(instant: OffsetDateTime) -> String {
    instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| instant.to_string())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::{date, datetime};

    #[test]
    fn test_from_json_keeps_integers_apart() {
        assert_eq!(Value::from(json!(42)), Value::Integer(42));
        assert_eq!(Value::from(json!(4.5)), Value::Number(4.5));
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Number(3.5).as_i64(), None);
        assert_eq!(Value::from("x").kind(), "string");
    }

    #[test]
    fn test_to_json_renders_rich_types() {
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_json(), json!("3q0="));
        assert_eq!(Value::Date(date!(1999 - 12 - 31)).to_json(), json!("1999-12-31"));
        assert_eq!(
            Value::DateTime(datetime!(2010-12-31 23:59:59.999 UTC)).to_json(),
            json!("2010-12-31T23:59:59.999Z")
        );
        assert_eq!(Value::Number(f64::INFINITY).to_json(), json!(null));
    }
}
