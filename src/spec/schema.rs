//! Typed view of a parameter's JSON Schema.
//!
//! Only the parts of JSON Schema that influence decoding are kept: the type,
//! the string format, array items, object properties and the date bounds.
//! Everything else (`pattern`, `minItems`, numeric ranges, ...) belongs to
//! structural validation and is ignored here.

use crate::parse::coerce::{parse_date, parse_date_time};
use crate::parse::SchemaError;
use crate::runtime_config::DecodeLimits;
use indexmap::IndexMap;
use serde_json::Value as Json;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Integer,
    Number,
    Boolean,
    String,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::String => "string",
        }
    }
}

/// The `format` keyword. Formats the decoder does not act on are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Byte,
    Binary,
    Date,
    DateTime,
    Password,
    Other(String),
}

impl Format {
    pub fn parse(s: &str) -> Self {
        match s {
            "byte" => Format::Byte,
            "binary" => Format::Binary,
            "date" => Format::Date,
            "date-time" => Format::DateTime,
            "password" => Format::Password,
            other => Format::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Format::Byte => "byte",
            Format::Binary => "binary",
            Format::Date => "date",
            Format::DateTime => "date-time",
            Format::Password => "password",
            Format::Other(s) => s,
        }
    }
}

/// A point on the calendar a date or date-time value is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Moment {
    Date(Date),
    DateTime(OffsetDateTime),
}

/// `minimum`/`maximum` of a `date` or `date-time` schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBound {
    /// The literal as written in the document, echoed in error messages
    pub literal: String,
    pub at: Moment,
    pub exclusive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSchema {
    pub kind: PrimitiveType,
    pub format: Option<Format>,
    pub minimum: Option<DateBound>,
    pub maximum: Option<DateBound>,
}

impl PrimitiveSchema {
    pub const fn new(kind: PrimitiveType) -> Self {
        PrimitiveSchema {
            kind,
            format: None,
            minimum: None,
            maximum: None,
        }
    }

    /// True when an empty string is a legitimate value rather than "no value".
    pub fn accepts_empty_string(&self) -> bool {
        self.kind == PrimitiveType::String
    }
}

/// Recursive type descriptor a structural value is walked against.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Primitive(PrimitiveSchema),
    ArrayOf(Box<SchemaNode>),
    ObjectOf(IndexMap<String, SchemaNode>),
}

/// Schema applied to object keys that have no declared property.
pub static DEFAULT_PROPERTY_SCHEMA: SchemaNode =
    SchemaNode::Primitive(PrimitiveSchema::new(PrimitiveType::String));

impl SchemaNode {
    pub fn string() -> Self {
        SchemaNode::Primitive(PrimitiveSchema::new(PrimitiveType::String))
    }

    pub fn integer() -> Self {
        SchemaNode::Primitive(PrimitiveSchema::new(PrimitiveType::Integer))
    }

    pub fn number() -> Self {
        SchemaNode::Primitive(PrimitiveSchema::new(PrimitiveType::Number))
    }

    pub fn boolean() -> Self {
        SchemaNode::Primitive(PrimitiveSchema::new(PrimitiveType::Boolean))
    }

    /// A `string` node with the given format.
    pub fn formatted(format: Format) -> Self {
        SchemaNode::Primitive(PrimitiveSchema {
            format: Some(format),
            ..PrimitiveSchema::new(PrimitiveType::String)
        })
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::ArrayOf(Box::new(items))
    }

    pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, SchemaNode)>) -> Self {
        SchemaNode::ObjectOf(
            properties
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaNode::Primitive(p) => p.kind.as_str(),
            SchemaNode::ArrayOf(_) => "array",
            SchemaNode::ObjectOf(_) => "object",
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveSchema> {
        match self {
            SchemaNode::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Build from a JSON Schema value whose `$ref`s are already expanded.
    pub fn from_json(schema: &Json) -> Result<Self, SchemaError> {
        Self::from_json_with_depth(schema, DecodeLimits::default().max_depth)
    }

    pub fn from_json_with_depth(schema: &Json, max_depth: usize) -> Result<Self, SchemaError> {
        build_node(schema, 0, max_depth)
    }
}

fn build_node(schema: &Json, depth: usize, max_depth: usize) -> Result<SchemaNode, SchemaError> {
    if depth > max_depth {
        return Err(SchemaError::TooDeep { limit: max_depth });
    }

    let obj = schema.as_object().ok_or_else(|| SchemaError::UnknownType {
        type_name: schema.to_string(),
    })?;

    let type_name = declared_type(obj);
    match type_name.as_str() {
        "array" => {
            let items = match obj.get("items") {
                Some(items) => build_node(items, depth + 1, max_depth)?,
                None => SchemaNode::string(),
            };
            Ok(SchemaNode::array(items))
        }
        "object" => {
            let mut properties = IndexMap::new();
            if let Some(props) = obj.get("properties").and_then(|p| p.as_object()) {
                for (name, prop) in props {
                    properties.insert(name.clone(), build_node(prop, depth + 1, max_depth)?);
                }
            }
            Ok(SchemaNode::ObjectOf(properties))
        }
        "integer" => build_primitive(PrimitiveType::Integer, obj),
        "number" => build_primitive(PrimitiveType::Number, obj),
        "boolean" => build_primitive(PrimitiveType::Boolean, obj),
        "string" => build_primitive(PrimitiveType::String, obj),
        _ => Err(SchemaError::UnknownType { type_name }),
    }
}

/// Resolve `type`, accepting OpenAPI 3.1 type arrays and inferring containers
/// from `items`/`properties` when `type` is omitted.
fn declared_type(obj: &serde_json::Map<String, Json>) -> String {
    match obj.get("type") {
        Some(Json::String(s)) => s.clone(),
        Some(Json::Array(types)) => types
            .iter()
            .filter_map(|t| t.as_str())
            .find(|t| *t != "null")
            .unwrap_or("null")
            .to_string(),
        Some(other) => other.to_string(),
        None if obj.contains_key("items") => "array".to_string(),
        None if obj.contains_key("properties") => "object".to_string(),
        None => "undefined".to_string(),
    }
}

fn build_primitive(
    kind: PrimitiveType,
    obj: &serde_json::Map<String, Json>,
) -> Result<SchemaNode, SchemaError> {
    let format = obj
        .get("format")
        .and_then(|f| f.as_str())
        .map(Format::parse);

    let mut primitive = PrimitiveSchema {
        kind,
        format,
        minimum: None,
        maximum: None,
    };

    match (kind, &primitive.format) {
        (PrimitiveType::String, Some(Format::Date)) | (PrimitiveType::String, Some(Format::DateTime)) => {
            let is_date = primitive.format == Some(Format::Date);
            primitive.minimum = date_bound(obj, "minimum", "exclusiveMinimum", is_date)?;
            primitive.maximum = date_bound(obj, "maximum", "exclusiveMaximum", is_date)?;
        }
        (PrimitiveType::Integer, _) | (PrimitiveType::Number, _) => {
            // Ranges are enforced by structural validation, but a bound that is
            // not a number means the document itself is broken.
            for keyword in ["minimum", "maximum"] {
                if let Some(bound) = obj.get(keyword) {
                    let numeric = bound.is_number()
                        || bound
                            .as_str()
                            .is_some_and(|s| s.trim().parse::<f64>().is_ok());
                    if !numeric {
                        return Err(SchemaError::InvalidBound {
                            keyword,
                            literal: literal_of(bound),
                        });
                    }
                }
            }
        }
        _ => {}
    }

    Ok(SchemaNode::Primitive(primitive))
}

fn date_bound(
    obj: &serde_json::Map<String, Json>,
    keyword: &'static str,
    exclusive_keyword: &'static str,
    is_date: bool,
) -> Result<Option<DateBound>, SchemaError> {
    // OpenAPI 3.1: exclusiveMaximum carries the bound itself.
    // OpenAPI 3.0: exclusiveMaximum is a boolean modifier of maximum.
    let (raw, bound_keyword) = match obj.get(exclusive_keyword) {
        Some(bound @ Json::String(_)) => (Some(bound), exclusive_keyword),
        _ => (obj.get(keyword), keyword),
    };
    let Some(raw) = raw else {
        return Ok(None);
    };

    let exclusive = bound_keyword == exclusive_keyword
        || obj
            .get(exclusive_keyword)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

    let literal = literal_of(raw);
    let invalid = || SchemaError::InvalidBound {
        keyword: bound_keyword,
        literal: literal.clone(),
    };
    let text = raw.as_str().ok_or_else(invalid)?;
    let at = if is_date {
        Moment::Date(parse_date(text).map_err(|_| invalid())?)
    } else {
        Moment::DateTime(parse_date_time(text).map_err(|_| invalid())?)
    };

    Ok(Some(DateBound {
        literal: text.to_string(),
        at,
        exclusive,
    }))
}

fn literal_of(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_schema() {
        let node = SchemaNode::from_json(&json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "id": { "type": "integer" },
                    "tags": { "type": "array", "items": { "type": "string" } }
                }
            }
        }))
        .unwrap();

        let SchemaNode::ArrayOf(items) = node else {
            panic!("expected array");
        };
        let SchemaNode::ObjectOf(props) = items.as_ref() else {
            panic!("expected object items");
        };
        assert_eq!(props["id"], SchemaNode::integer());
        assert_eq!(props["tags"], SchemaNode::array(SchemaNode::string()));
    }

    #[test]
    fn test_unknown_type_is_configuration_error() {
        let err = SchemaNode::from_json(&json!({"type": "file"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"file\" is not a JSON Schema primitive type."
        );
    }

    #[test]
    fn test_openapi_31_type_arrays() {
        let node = SchemaNode::from_json(&json!({"type": ["null", "integer"]})).unwrap();
        assert_eq!(node, SchemaNode::integer());
    }

    #[test]
    fn test_type_inferred_from_items() {
        let node = SchemaNode::from_json(&json!({"items": {"type": "number"}})).unwrap();
        assert_eq!(node, SchemaNode::array(SchemaNode::number()));
        assert!(SchemaNode::from_json(&json!({})).is_err());
    }

    #[test]
    fn test_date_time_bounds() {
        let node = SchemaNode::from_json(&json!({
            "type": "string",
            "format": "date-time",
            "maximum": "2009-08-12T00:00:00.000Z",
            "exclusiveMaximum": true
        }))
        .unwrap();
        let max = node.as_primitive().unwrap().maximum.as_ref().unwrap();
        assert!(max.exclusive);
        assert_eq!(max.literal, "2009-08-12T00:00:00.000Z");
    }

    #[test]
    fn test_invalid_date_bound() {
        let err = SchemaNode::from_json(&json!({
            "type": "string",
            "format": "date-time",
            "maximum": "2009-12-27T19:20:76Z"
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The \"maximum\" value in the OpenAPI definition is invalid (\"2009-12-27T19:20:76Z\")."
        );
    }

    #[test]
    fn test_non_numeric_minimum() {
        let err = SchemaNode::from_json(&json!({"type": "integer", "minimum": "ten"})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidBound { keyword: "minimum", .. }));
    }

    #[test]
    fn test_depth_limit() {
        let mut schema = json!({"type": "string"});
        for _ in 0..5 {
            schema = json!({"type": "array", "items": schema});
        }
        assert!(SchemaNode::from_json_with_depth(&schema, 5).is_ok());
        assert_eq!(
            SchemaNode::from_json_with_depth(&schema, 4),
            Err(SchemaError::TooDeep { limit: 4 })
        );
    }
}
