//! Leaf coercion: one string into one typed primitive.

use super::error::ValueError;
use crate::spec::{DateBound, Format, Moment, PrimitiveSchema, PrimitiveType};
use crate::value::Value;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime};

#[allow(clippy::expect_used)]
static DATE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

#[allow(clippy::expect_used)]
static DATE_TIME_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(Z|[+-][0-9]{2}:[0-9]{2})$")
        .expect("valid date-time regex")
});

/// Coerce `value` according to `schema`.
///
/// Anything that is not a string is returned unchanged, so coercing an
/// already-coerced value is a no-op.
pub fn coerce_primitive(schema: &PrimitiveSchema, value: Value) -> Result<Value, ValueError> {
    let text = match value {
        Value::String(text) => text,
        other => return Ok(other),
    };

    match schema.kind {
        PrimitiveType::Integer => parse_integer(&text),
        PrimitiveType::Number => parse_number(&text).map(Value::Number),
        PrimitiveType::Boolean => parse_boolean(&text),
        PrimitiveType::String => match &schema.format {
            Some(Format::Byte) => parse_bytes(&text),
            Some(Format::Binary) => Ok(Value::Bytes(binary_bytes(&text))),
            Some(Format::Date) => {
                let date = parse_date(&text)?;
                check_bounds(schema, &text, Moment::Date(date))?;
                Ok(Value::Date(date))
            }
            Some(Format::DateTime) => {
                let instant = parse_date_time(&text)?;
                check_bounds(schema, &text, Moment::DateTime(instant))?;
                Ok(Value::DateTime(instant))
            }
            Some(Format::Password) | Some(Format::Other(_)) | None => Ok(Value::String(text)),
        },
    }
}

fn parse_integer(text: &str) -> Result<Value, ValueError> {
    if let Ok(i) = text.trim().parse::<i64>() {
        return Ok(Value::Integer(i));
    }

    let n = parse_number(text)?;
    if n.floor() != n {
        return Err(ValueError::NotWholeNumber {
            value: text.to_string(),
        });
    }
    if n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Ok(Value::Integer(n as i64))
    } else {
        Ok(Value::Number(n))
    }
}

fn parse_number(text: &str) -> Result<f64, ValueError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValueError::NotNumeric {
            value: text.to_string(),
        })
}

fn parse_boolean(text: &str) -> Result<Value, ValueError> {
    match text.trim().to_lowercase().as_str() {
        "true" => Ok(Value::Boolean(true)),
        "false" => Ok(Value::Boolean(false)),
        _ => Err(ValueError::NotBoolean {
            value: text.to_string(),
        }),
    }
}

fn parse_bytes(text: &str) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(trimmed).ok())
        .map(Value::Bytes)
        .ok_or_else(|| ValueError::InvalidBase64 {
            value: text.to_string(),
        })
}

/// One byte per character; code points above 0xFF keep their low byte.
fn binary_bytes(text: &str) -> Vec<u8> {
    text.chars().map(|c| (c as u32 & 0xFF) as u8).collect()
}

/// Parse an RFC 3339 `full-date`.
pub(crate) fn parse_date(text: &str) -> Result<Date, ValueError> {
    if !DATE_FORMAT.is_match(text) {
        return Err(ValueError::MalformedDate {
            value: text.to_string(),
        });
    }

    let invalid = || ValueError::InvalidDate {
        value: text.to_string(),
    };
    // The regex guarantees ASCII digits at fixed offsets.
    let year: i32 = text[0..4].parse().map_err(|_| invalid())?;
    let month: u8 = text[5..7].parse().map_err(|_| invalid())?;
    let day: u8 = text[8..10].parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

/// Parse an RFC 3339 `date-time`.
pub(crate) fn parse_date_time(text: &str) -> Result<OffsetDateTime, ValueError> {
    if !DATE_TIME_FORMAT.is_match(text) {
        return Err(ValueError::MalformedDateTime {
            value: text.to_string(),
        });
    }
    OffsetDateTime::parse(text, &Rfc3339).map_err(|_| ValueError::InvalidDateTime {
        value: text.to_string(),
    })
}

fn check_bounds(schema: &PrimitiveSchema, text: &str, at: Moment) -> Result<(), ValueError> {
    if let Some(DateBound {
        literal,
        at: minimum,
        exclusive,
    }) = &schema.minimum
    {
        if at < *minimum || (*exclusive && at == *minimum) {
            return Err(ValueError::BelowMinimum {
                value: text.to_string(),
                minimum: literal.clone(),
                exclusive: *exclusive && at == *minimum,
            });
        }
    }
    if let Some(DateBound {
        literal,
        at: maximum,
        exclusive,
    }) = &schema.maximum
    {
        if at > *maximum || (*exclusive && at == *maximum) {
            return Err(ValueError::AboveMaximum {
                value: text.to_string(),
                maximum: literal.clone(),
                exclusive: *exclusive && at == *maximum,
            });
        }
    }
    Ok(())
}
