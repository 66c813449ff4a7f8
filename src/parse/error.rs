use crate::spec::{ParameterDefinition, ParameterLocation, ParameterStyle};
use http::StatusCode;
use std::fmt;

/// A raw value that does not lexically match its schema.
///
/// Always the client's fault, so always a 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    NotWholeNumber { value: String },
    NotNumeric { value: String },
    NotBoolean { value: String },
    InvalidBase64 { value: String },
    MalformedDate { value: String },
    InvalidDate { value: String },
    MalformedDateTime { value: String },
    InvalidDateTime { value: String },
    BelowMinimum {
        value: String,
        minimum: String,
        exclusive: bool,
    },
    AboveMaximum {
        value: String,
        maximum: String,
        exclusive: bool,
    },
    /// The wire string lacks the prefix/shape its style requires
    MalformedStyle { style: ParameterStyle, value: String },
    /// A JSON `content` parameter that is not valid JSON
    InvalidJson { error: String },
    TooDeep { limit: usize },
    TooManyItems { limit: usize },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::NotWholeNumber { value } => write!(f, "\"{value}\" is not a whole number."),
            ValueError::NotNumeric { value } => {
                write!(f, "\"{value}\" is not a valid numeric value.")
            }
            ValueError::NotBoolean { value } => {
                write!(f, "\"{value}\" is not a valid boolean value.")
            }
            ValueError::InvalidBase64 { value } => {
                write!(f, "\"{value}\" is not a valid base64 byte sequence.")
            }
            ValueError::MalformedDate { value } => {
                write!(f, "\"{value}\" is not a properly-formatted date.")
            }
            ValueError::InvalidDate { value } => write!(f, "\"{value}\" is not a valid date."),
            ValueError::MalformedDateTime { value } => {
                write!(f, "\"{value}\" is not a properly-formatted date-time.")
            }
            ValueError::InvalidDateTime { value } => {
                write!(f, "\"{value}\" is an invalid date-time.")
            }
            ValueError::BelowMinimum {
                value,
                minimum,
                exclusive: false,
            } => write!(f, "\"{value}\" is less than minimum ({minimum})."),
            ValueError::BelowMinimum {
                value,
                minimum,
                exclusive: true,
            } => write!(f, "\"{value}\" is equal to exclusive minimum ({minimum})."),
            ValueError::AboveMaximum {
                value,
                maximum,
                exclusive: false,
            } => write!(f, "\"{value}\" is greater than maximum ({maximum})."),
            ValueError::AboveMaximum {
                value,
                maximum,
                exclusive: true,
            } => write!(f, "\"{value}\" is equal to exclusive maximum ({maximum})."),
            ValueError::MalformedStyle { style, value } => {
                write!(f, "\"{value}\" is not a properly-formatted {style} value.")
            }
            ValueError::InvalidJson { error } => write!(f, "Invalid JSON: {error}."),
            ValueError::TooDeep { limit } => {
                write!(f, "Value is nested deeper than the maximum depth of {limit}.")
            }
            ValueError::TooManyItems { limit } => {
                write!(f, "Value has more than the maximum of {limit} items.")
            }
        }
    }
}

impl std::error::Error for ValueError {}

/// The parameter definition itself is broken.
///
/// Raised for problems in the API document rather than in the request, so it
/// maps to a 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// `type` is not one of integer, number, boolean, string, array, object
    UnknownType { type_name: String },
    /// A `minimum`/`maximum` literal that cannot be parsed for its schema
    InvalidBound {
        keyword: &'static str,
        literal: String,
    },
    /// The schema's `default` does not decode against the schema
    InvalidDefault { reason: String },
    /// The style cannot serialize a value of this schema type
    StyleMismatch {
        style: ParameterStyle,
        schema_type: &'static str,
    },
    UnknownStyle { style: String },
    /// Neither `schema` nor `content` is set
    MissingSchema,
    TooDeep { limit: usize },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnknownType { type_name } => {
                write!(f, "\"{type_name}\" is not a JSON Schema primitive type.")
            }
            SchemaError::InvalidBound { keyword, literal } => write!(
                f,
                "The \"{keyword}\" value in the OpenAPI definition is invalid (\"{literal}\")."
            ),
            SchemaError::InvalidDefault { reason } => write!(
                f,
                "The default value in the OpenAPI definition is invalid. {reason}"
            ),
            SchemaError::StyleMismatch { style, schema_type } => write!(
                f,
                "The \"{style}\" style cannot be used with {schema_type} parameters."
            ),
            SchemaError::UnknownStyle { style } => {
                write!(f, "\"{style}\" is not an OpenAPI parameter style.")
            }
            SchemaError::MissingSchema => {
                write!(f, "The parameter has neither a schema nor a content definition.")
            }
            SchemaError::TooDeep { limit } => {
                write!(f, "The schema is nested deeper than the maximum depth of {limit}.")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// A [`ValueError`] together with the path at which it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedError {
    /// Rendered path, e.g. `colors[2]` or `filter.size`
    pub path: String,
    pub error: ValueError,
}

/// Failure of a single parameter decode, as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    /// The request carried a value that does not fit the schema
    Invalid {
        name: String,
        location: ParameterLocation,
        path: String,
        source: ValueError,
    },
    /// The parameter definition is broken
    Misconfigured {
        name: String,
        location: ParameterLocation,
        source: SchemaError,
    },
    MissingRequired {
        name: String,
        location: ParameterLocation,
    },
}

impl ParameterError {
    pub(crate) fn invalid(param: &ParameterDefinition, located: LocatedError) -> Self {
        ParameterError::Invalid {
            name: param.name.clone(),
            location: param.location,
            path: located.path,
            source: located.error,
        }
    }

    pub(crate) fn misconfigured(param: &ParameterDefinition, source: SchemaError) -> Self {
        ParameterError::Misconfigured {
            name: param.name.clone(),
            location: param.location,
            source,
        }
    }

    pub(crate) fn missing(param: &ParameterDefinition) -> Self {
        ParameterError::MissingRequired {
            name: param.name.clone(),
            location: param.location,
        }
    }

    /// 400 for anything the client sent, 500 for a broken API document.
    pub fn status(&self) -> StatusCode {
        match self {
            ParameterError::Invalid { .. } | ParameterError::MissingRequired { .. } => {
                StatusCode::BAD_REQUEST
            }
            ParameterError::Misconfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterError::Invalid { name, .. }
            | ParameterError::Misconfigured { name, .. }
            | ParameterError::MissingRequired { name, .. } => name,
        }
    }

    pub fn location(&self) -> ParameterLocation {
        match self {
            ParameterError::Invalid { location, .. }
            | ParameterError::Misconfigured { location, .. }
            | ParameterError::MissingRequired { location, .. } => *location,
        }
    }

    /// Path of the failing element, when the failure is nested below the parameter.
    pub fn path(&self) -> Option<&str> {
        match self {
            ParameterError::Invalid { name, path, .. } if path != name => Some(path),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterError::Invalid {
                name,
                location,
                path,
                source,
            } => {
                write!(f, "The \"{name}\" {location} parameter is invalid.")?;
                if path != name {
                    write!(f, " Error at {path}.")?;
                }
                write!(f, " {source}")
            }
            ParameterError::Misconfigured {
                name,
                location,
                source,
            } => write!(f, "The \"{name}\" {location} parameter is invalid. {source}"),
            ParameterError::MissingRequired { name, location } => {
                write!(f, "Missing required {location} parameter \"{name}\".")
            }
        }
    }
}

impl std::error::Error for ParameterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParameterError::Invalid { source, .. } => Some(source),
            ParameterError::Misconfigured { source, .. } => Some(source),
            ParameterError::MissingRequired { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(path: &str) -> ParameterError {
        ParameterError::Invalid {
            name: "ids".to_string(),
            location: ParameterLocation::Query,
            path: path.to_string(),
            source: ValueError::NotWholeNumber {
                value: "3.5".to_string(),
            },
        }
    }

    #[test]
    fn test_message_without_nested_path() {
        let err = invalid("ids");
        assert_eq!(
            err.to_string(),
            "The \"ids\" query parameter is invalid. \"3.5\" is not a whole number."
        );
        assert_eq!(err.path(), None);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_message_with_nested_path() {
        let err = invalid("ids[2]");
        assert_eq!(
            err.to_string(),
            "The \"ids\" query parameter is invalid. Error at ids[2]. \"3.5\" is not a whole number."
        );
        assert_eq!(err.path(), Some("ids[2]"));
    }

    #[test]
    fn test_configuration_errors_are_500() {
        let err = ParameterError::Misconfigured {
            name: "when".to_string(),
            location: ParameterLocation::Header,
            source: SchemaError::UnknownType {
                type_name: "file".to_string(),
            },
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("\"file\" is not a JSON Schema primitive type."));
    }

    #[test]
    fn test_missing_required_message() {
        let err = ParameterError::MissingRequired {
            name: "Test".to_string(),
            location: ParameterLocation::Header,
        };
        assert_eq!(err.to_string(), "Missing required header parameter \"Test\".");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
