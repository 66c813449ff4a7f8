//! # Parameter Decoding
//!
//! Turns the raw string a request carried for one OpenAPI parameter into a
//! typed [`Value`].
//!
//! Decoding runs in two stages:
//!
//! 1. [`decode_style`] splits the wire string according to the parameter's
//!    `style`/`explode` (or parses its `content` document) into a
//!    [`Structural`] value whose leaves are still strings.
//! 2. [`walk`] descends that value alongside the schema, coercing each leaf
//!    with [`coerce::coerce_primitive`] and tracking the path for errors.
//!
//! ```rust
//! use brrtparam::parse::decode_str;
//! use brrtparam::spec::{ParameterDefinition, ParameterLocation, ParameterStyle, SchemaNode};
//! use brrtparam::value::Value;
//!
//! let param = ParameterDefinition::new(
//!     "ids",
//!     ParameterLocation::Path,
//!     SchemaNode::array(SchemaNode::integer()),
//! )
//! .style(ParameterStyle::Label);
//!
//! let value = decode_str(&param, ".3.4.5").unwrap();
//! assert_eq!(
//!     value,
//!     Some(Value::Array(vec![Value::Integer(3), Value::Integer(4), Value::Integer(5)]))
//! );
//! ```
//!
//! ## Errors
//!
//! Values the client got wrong become [`ParameterError::Invalid`] (400).
//! Problems with the parameter definition itself, including a `default` that
//! does not decode, become [`ParameterError::Misconfigured`] (500).

pub mod coerce;
mod context;
mod error;
mod style;
mod walk;

pub use context::ParseContext;
pub use error::{LocatedError, ParameterError, SchemaError, ValueError};
pub use style::{decode_style, is_json_mime, Decoded, RawValue, Structural, StyleError};
pub use walk::walk;

use crate::logging::{redact_value, redaction_level, RedactionLevel};
use crate::runtime_config::DecodeLimits;
use crate::spec::{Format, ParameterDefinition};
use crate::value::Value;
use tracing::{debug, error, warn};

/// Decode one parameter with the default [`DecodeLimits`].
///
/// `raw` is `None` when the request did not carry the parameter at all; the
/// schema default is used then, and `Ok(None)` is returned when there is none.
pub fn decode_parameter(
    param: &ParameterDefinition,
    raw: Option<&RawValue>,
) -> Result<Option<Value>, ParameterError> {
    decode_parameter_with_limits(param, raw, &DecodeLimits::default())
}

/// Decode a single wire string.
pub fn decode_str(param: &ParameterDefinition, raw: &str) -> Result<Option<Value>, ParameterError> {
    decode_parameter(param, Some(&RawValue::from(raw)))
}

pub fn decode_parameter_with_limits(
    param: &ParameterDefinition,
    raw: Option<&RawValue>,
    limits: &DecodeLimits,
) -> Result<Option<Value>, ParameterError> {
    let decoded = match decode_style(param, raw, limits) {
        Ok(Some(decoded)) => decoded,
        Ok(None) => return Ok(None),
        Err(StyleError::Value(e)) => {
            let located = LocatedError {
                path: param.name.clone(),
                error: e,
            };
            return Err(rejected(param, raw, located));
        }
        Err(StyleError::Schema(e)) => return Err(misconfigured(param, e)),
    };

    let schema = param
        .value_schema()
        .ok_or_else(|| misconfigured(param, SchemaError::MissingSchema))?;
    let ctx = ParseContext::new(&param.name);

    match decoded {
        Decoded::Wire(structural) => {
            let value = walk(schema, structural, &ctx, limits)
                .map_err(|located| rejected(param, raw, located))?;
            debug!(param = %param.name, location = %param.location, kind = value.kind(), "parameter decoded");
            Ok(Some(value))
        }
        Decoded::Default(structural) => {
            let value = walk(schema, structural, &ctx, limits).map_err(|located| {
                let reason = if located.path == param.name {
                    located.error.to_string()
                } else {
                    format!("Error at {}. {}", located.path, located.error)
                };
                misconfigured(param, SchemaError::InvalidDefault { reason })
            })?;
            debug!(param = %param.name, location = %param.location, "parameter defaulted");
            Ok(Some(value))
        }
    }
}

fn rejected(
    param: &ParameterDefinition,
    raw: Option<&RawValue>,
    located: LocatedError,
) -> ParameterError {
    let raw = raw.map(RawValue::last).unwrap_or("");
    let is_password = param
        .value_schema()
        .and_then(|s| s.as_primitive())
        .is_some_and(|p| p.format == Some(Format::Password));
    let level = match redaction_level() {
        RedactionLevel::Credentials if is_password => RedactionLevel::Full,
        level => level,
    };
    warn!(
        param = %param.name,
        location = %param.location,
        path = %located.path,
        raw = %redact_value(level, &param.name, raw),
        reason = %located.error,
        "parameter rejected"
    );
    ParameterError::invalid(param, located)
}

fn misconfigured(param: &ParameterDefinition, e: SchemaError) -> ParameterError {
    error!(
        param = %param.name,
        location = %param.location,
        error = %e,
        "parameter definition is invalid"
    );
    ParameterError::misconfigured(param, e)
}
