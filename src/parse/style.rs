//! Style decoding: one wire string into a structural value.
//!
//! This stage only splits and groups; leaf strings are left as
//! [`Structural::Text`] for the walker to coerce.
//!
//! | style          | array (explode=false) | array (explode=true)     | object (explode=false) | object (explode=true)   |
//! |----------------|-----------------------|--------------------------|------------------------|-------------------------|
//! | matrix         | `;id=3,4,5`           | `;id=3;id=4;id=5`        | `;id=role,admin,n,x`   | `;role=admin;n=x`       |
//! | label          | `.3.4.5`              | `.3.4.5`                 | `.role.admin.n.x`      | `.role=admin.n=x`       |
//! | simple         | `3,4,5`               | `3,4,5`                  | `role,admin,n,x`       | `role=admin,n=x`        |
//! | form           | `3,4,5`               | `id=3&id=4&id=5`         | `role,admin,n,x`       | `role=admin&n=x`        |
//! | spaceDelimited | `3 4 5`               | `3 4 5`                  | `role admin n x`       | `role admin n x`        |
//! | pipeDelimited  | `3|4|5`               | `3|4|5`                  | `role|admin|n|x`       | `role|admin|n|x`        |
//! | deepObject     | n/a                   | n/a                      | `id[role]=admin&id[n]=x` (explode ignored)       |

use super::error::{SchemaError, ValueError};
use crate::runtime_config::DecodeLimits;
use crate::spec::{ParameterDefinition, ParameterLocation, ParameterStyle, SchemaNode};
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use tracing::trace;

/// Intermediate shape between the wire string and the typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Structural {
    /// A leaf that still has to be coerced
    Text(String),
    Sequence(Vec<Structural>),
    Mapping(IndexMap<String, Structural>),
    /// A leaf that is already typed (defaults, JSON literals)
    Typed(Value),
}

impl Structural {
    /// Lift a typed value; strings become coercible leaves again.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Structural::Text(s),
            Value::Array(items) => {
                Structural::Sequence(items.into_iter().map(Structural::from_value).collect())
            }
            Value::Object(map) => Structural::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Structural::from_value(v)))
                    .collect(),
            ),
            other => Structural::Typed(other),
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        Structural::from_value(Value::from(json))
    }

    /// Lower to a value without coercing anything.
    pub fn into_value(self) -> Value {
        match self {
            Structural::Text(s) => Value::String(s),
            Structural::Sequence(items) => {
                Value::Array(items.into_iter().map(Structural::into_value).collect())
            }
            Structural::Mapping(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect(),
            ),
            Structural::Typed(value) => value,
        }
    }

    fn text(s: &str) -> Self {
        Structural::Text(s.to_string())
    }
}

/// A raw parameter value as the request extractor found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Single(String),
    /// A query/form key that appeared more than once, in wire order
    Repeated(Vec<String>),
}

impl RawValue {
    /// What a last-wins transport would have reported.
    pub fn last(&self) -> &str {
        match self {
            RawValue::Single(s) => s,
            RawValue::Repeated(values) => values.last().map(String::as_str).unwrap_or(""),
        }
    }

    /// Record another occurrence of the same key.
    pub fn push(&mut self, value: String) {
        match self {
            RawValue::Single(first) => {
                let first = std::mem::take(first);
                *self = RawValue::Repeated(vec![first, value]);
            }
            RawValue::Repeated(values) => values.push(value),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, RawValue::Single(s) if s.is_empty())
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Single(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Single(s)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            RawValue::Single(values.remove(0))
        } else {
            RawValue::Repeated(values)
        }
    }
}

/// Result of style decoding, tagged with where the value came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Parsed from the request
    Wire(Structural),
    /// The schema default, used because the request carried no value
    Default(Structural),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    Value(ValueError),
    Schema(SchemaError),
}

impl From<ValueError> for StyleError {
    fn from(e: ValueError) -> Self {
        StyleError::Value(e)
    }
}

impl From<SchemaError> for StyleError {
    fn from(e: SchemaError) -> Self {
        StyleError::Schema(e)
    }
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleError::Value(e) => e.fmt(f),
            StyleError::Schema(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for StyleError {}

/// Split a raw value into its structural shape according to the parameter's
/// style, explode flag and location.
///
/// Returns `Ok(None)` when there is no value and no default.
pub fn decode_style(
    param: &ParameterDefinition,
    raw: Option<&RawValue>,
    limits: &DecodeLimits,
) -> Result<Option<Decoded>, StyleError> {
    let schema = param.value_schema().ok_or(SchemaError::MissingSchema)?;
    let accepts_empty = schema
        .as_primitive()
        .is_some_and(|p| p.accepts_empty_string());

    let raw = match raw {
        None => return Ok(fallback(param)),
        Some(raw) if raw.is_blank() && !accepts_empty && param.default.is_some() => {
            return Ok(fallback(param))
        }
        Some(raw) => raw,
    };

    if let Some((mime, _)) = param.content_schema() {
        trace!(param = %param.name, mime = %mime, "decoding content parameter");
        return decode_content(mime, raw.last(), accepts_empty).map(|s| Some(Decoded::Wire(s)));
    }

    let style = param.effective_style();
    trace!(
        param = %param.name,
        style = %style,
        explode = param.explode,
        schema_type = schema.type_name(),
        "decoding parameter style"
    );

    let structural = match schema {
        SchemaNode::Primitive(_) => decode_scalar(param, style, raw)?,
        SchemaNode::ArrayOf(_) => decode_array(param, style, raw)?,
        SchemaNode::ObjectOf(_) => decode_object(param, style, raw, limits)?,
    };
    Ok(Some(Decoded::Wire(structural)))
}

fn fallback(param: &ParameterDefinition) -> Option<Decoded> {
    param
        .default
        .clone()
        .map(|default| Decoded::Default(Structural::from_value(default)))
}

fn malformed(style: ParameterStyle, text: &str) -> ValueError {
    ValueError::MalformedStyle {
        style,
        value: text.to_string(),
    }
}

fn decode_scalar(
    param: &ParameterDefinition,
    style: ParameterStyle,
    raw: &RawValue,
) -> Result<Structural, StyleError> {
    let text = raw.last();
    let value = match style {
        ParameterStyle::Matrix => {
            matrix_value(&param.name, text).ok_or_else(|| malformed(style, text))?
        }
        ParameterStyle::Label => text.strip_prefix('.').ok_or_else(|| malformed(style, text))?,
        ParameterStyle::DeepObject => {
            return Err(SchemaError::StyleMismatch {
                style,
                schema_type: "primitive",
            }
            .into())
        }
        ParameterStyle::Form
        | ParameterStyle::Simple
        | ParameterStyle::SpaceDelimited
        | ParameterStyle::PipeDelimited => text,
    };
    Ok(Structural::text(value))
}

fn decode_array(
    param: &ParameterDefinition,
    style: ParameterStyle,
    raw: &RawValue,
) -> Result<Structural, StyleError> {
    // A repeated key is already the exploded sequence.
    if let RawValue::Repeated(values) = raw {
        if param.explode {
            return Ok(Structural::Sequence(
                values.iter().map(|v| Structural::text(v)).collect(),
            ));
        }
    }

    let text = raw.last();
    let items: Vec<String> = match style {
        ParameterStyle::Matrix if !param.explode => {
            let value = matrix_value(&param.name, text).ok_or_else(|| malformed(style, text))?;
            split_non_empty(value, ',')
        }
        ParameterStyle::Matrix => matrix_segments(text)
            .ok_or_else(|| malformed(style, text))?
            .into_iter()
            .filter(|(key, _)| *key == param.name)
            .map(|(_, value)| value.to_string())
            .collect(),
        ParameterStyle::Label => {
            let value = text.strip_prefix('.').ok_or_else(|| malformed(style, text))?;
            split_non_empty(value, '.')
        }
        ParameterStyle::Simple => split_all(text, ','),
        ParameterStyle::Form if !param.explode => split_all(text, ','),
        ParameterStyle::Form => match param.location {
            // Cookies have no repeated-key form; `color=blue&color=green` arrives
            // as the single cookie value `blue&color=green`.
            ParameterLocation::Cookie => {
                let query = format!("{}={}", param.name, text);
                url::form_urlencoded::parse(query.as_bytes())
                    .filter(|(key, _)| key.as_ref() == param.name)
                    .map(|(_, value)| value.into_owned())
                    .collect()
            }
            // A key that appeared once was collapsed to a plain string by the
            // transport; it is still a one-element array.
            _ => vec![text.to_string()],
        },
        ParameterStyle::SpaceDelimited => split_all(text, ' '),
        ParameterStyle::PipeDelimited => split_all(text, '|'),
        ParameterStyle::DeepObject => {
            return Err(SchemaError::StyleMismatch {
                style,
                schema_type: "array",
            }
            .into())
        }
    };

    Ok(Structural::Sequence(
        items.into_iter().map(Structural::Text).collect(),
    ))
}

fn decode_object(
    param: &ParameterDefinition,
    style: ParameterStyle,
    raw: &RawValue,
    limits: &DecodeLimits,
) -> Result<Structural, StyleError> {
    let text = raw.last();
    let map = match style {
        ParameterStyle::Matrix if !param.explode => {
            let value = matrix_value(&param.name, text).ok_or_else(|| malformed(style, text))?;
            pairs(split_non_empty(value, ','))
        }
        ParameterStyle::Matrix => key_values(
            matrix_segments(text)
                .ok_or_else(|| malformed(style, text))?
                .into_iter(),
        ),
        ParameterStyle::Label => {
            let value = text.strip_prefix('.').ok_or_else(|| malformed(style, text))?;
            if param.explode {
                key_values(split_non_empty(value, '.').iter().map(|s| split_pair(s)))
            } else {
                pairs(split_non_empty(value, '.'))
            }
        }
        ParameterStyle::Simple if param.explode => {
            key_values(split_non_empty(text, ',').iter().map(|s| split_pair(s)))
        }
        ParameterStyle::Simple => pairs(split_non_empty(text, ',')),
        ParameterStyle::Form if param.explode => query_object(text),
        ParameterStyle::Form => pairs(split_non_empty(text, ',')),
        ParameterStyle::SpaceDelimited => pairs(split_non_empty(text, ' ')),
        ParameterStyle::PipeDelimited => pairs(split_non_empty(text, '|')),
        ParameterStyle::DeepObject => deep_object(&param.name, text, limits)?,
    };
    Ok(Structural::Mapping(map))
}

fn decode_content(mime: &str, text: &str, accepts_empty: bool) -> Result<Structural, StyleError> {
    if text.is_empty() && accepts_empty {
        return Ok(Structural::Text(String::new()));
    }
    if is_json_mime(mime) {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ValueError::InvalidJson {
                error: e.to_string(),
            })?;
        Ok(Structural::from_json(json))
    } else {
        // Other media types are not interpreted.
        Ok(Structural::Typed(Value::String(text.to_string())))
    }
}

/// `application/json`, `text/json`, `application/problem+json`, ...
pub fn is_json_mime(mime: &str) -> bool {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some((_, subtype)) => subtype == "json" || subtype.ends_with("+json"),
        None => essence == "json",
    }
}

/// `;name=value` → `value`; `;name` → empty.
fn matrix_value<'t>(name: &str, text: &'t str) -> Option<&'t str> {
    let rest = text.strip_prefix(';')?.strip_prefix(name)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('=')
    }
}

/// `;a=1;b=2` → `[(a, 1), (b, 2)]`
fn matrix_segments(text: &str) -> Option<Vec<(&str, &str)>> {
    let rest = text.strip_prefix(';')?;
    Some(rest.split(';').map(split_pair).collect())
}

fn split_pair(segment: &str) -> (&str, &str) {
    segment.split_once('=').unwrap_or((segment, ""))
}

fn split_all(text: &str, delimiter: char) -> Vec<String> {
    text.split(delimiter).map(str::to_string).collect()
}

fn split_non_empty(text: &str, delimiter: char) -> Vec<String> {
    if text.is_empty() {
        Vec::new()
    } else {
        split_all(text, delimiter)
    }
}

/// `[k1, v1, k2, v2]` → `{k1: v1, k2: v2}`; an odd trailing key maps to null.
fn pairs(items: Vec<String>) -> IndexMap<String, Structural> {
    let mut map = IndexMap::new();
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        let value = iter
            .next()
            .map(Structural::Text)
            .unwrap_or(Structural::Typed(Value::Null));
        map.insert(key, value);
    }
    map
}

fn key_values<'s>(
    entries: impl Iterator<Item = (&'s str, &'s str)>,
) -> IndexMap<String, Structural> {
    entries
        .map(|(k, v)| (k.to_string(), Structural::text(v)))
        .collect()
}

/// Insert, turning a repeated key into a sequence of its values.
fn insert_repeated(map: &mut IndexMap<String, Structural>, key: String, value: Structural) {
    match map.get_mut(&key) {
        Some(Structural::Sequence(values)) => values.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, Structural::Sequence(Vec::new()));
            *existing = Structural::Sequence(vec![first, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}

fn query_object(text: &str) -> IndexMap<String, Structural> {
    let mut map = IndexMap::new();
    for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
        insert_repeated(&mut map, key.into_owned(), Structural::Text(value.into_owned()));
    }
    map
}

/// `name[a]=1&name[b][c]=2` → `{a: 1, b: {c: 2}}`. Keys of other parameters
/// are skipped.
///
/// Bracket depth and the number of entries are bounded here, before any
/// nesting is built.
fn deep_object(
    name: &str,
    text: &str,
    limits: &DecodeLimits,
) -> Result<IndexMap<String, Structural>, ValueError> {
    let mut map = IndexMap::new();
    let mut entries = 0usize;
    for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
        let Some(brackets) = key.strip_prefix(name).and_then(|r| r.strip_prefix('[')) else {
            continue;
        };
        entries += 1;
        if entries > limits.max_items {
            return Err(ValueError::TooManyItems {
                limit: limits.max_items,
            });
        }
        let malformed_key = || malformed(ParameterStyle::DeepObject, &key);
        let inner = brackets.strip_suffix(']').ok_or_else(malformed_key)?;
        let segments: Vec<&str> = inner.split("][").collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(malformed_key());
        }
        if segments.len() > limits.max_depth {
            return Err(ValueError::TooDeep {
                limit: limits.max_depth,
            });
        }
        insert_nested(&mut map, &segments, Structural::Text(value.into_owned()))
            .ok_or_else(malformed_key)?;
    }
    Ok(map)
}

fn insert_nested(
    map: &mut IndexMap<String, Structural>,
    segments: &[&str],
    value: Structural,
) -> Option<()> {
    match segments {
        [] => None,
        [last] => {
            if let Some(Structural::Mapping(_)) = map.get(*last) {
                return None;
            }
            insert_repeated(map, last.to_string(), value);
            Some(())
        }
        [first, rest @ ..] => {
            let child = map
                .entry(first.to_string())
                .or_insert_with(|| Structural::Mapping(IndexMap::new()));
            match child {
                Structural::Mapping(inner) => insert_nested(inner, rest, value),
                _ => None,
            }
        }
    }
}
