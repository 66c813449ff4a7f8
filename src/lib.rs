//! # brrtparam
//!
//! **brrtparam** decodes OpenAPI 3 request parameters: it takes the raw
//! string a path segment, query key, header, cookie or form field carried and
//! turns it into a typed value, following the parameter's `style`, `explode`
//! and `content` declarations and its JSON Schema.
//!
//! ## Overview
//!
//! OpenAPI lets one logical value travel in many wire shapes: the array
//! `[3, 4, 5]` can arrive as `3,4,5`, `.3.4.5`, `;id=3;id=4;id=5`,
//! `3|4|5` or `id=3&id=4&id=5`. This crate recovers the array (or object, or
//! scalar), coerces every leaf to its schema type, and reports failures with
//! the exact location of the offending element (`ids[2]`, `filter.size`).
//!
//! ## Architecture
//!
//! - **[`spec`]** - Parameter definitions and schema nodes; loading them from OpenAPI documents
//! - **[`parse`]** - Style decoding, structural walk and primitive coercion
//! - **[`value`]** - The typed value model decoded parameters produce
//! - **[`request`]** - Extracting raw values from an HTTP request and decoding a whole operation
//! - **[`runtime_config`]** - Depth and size limits from the environment
//! - **[`logging`]** - `tracing` subscriber setup and value redaction
//! - **[`validator`]** - Collected issues found while loading a document
//! - **[`cli`]** - The `brrtparam` command-line tool
//!
//! ### Decode Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host
//!     participant Req as request::RawParameters
//!     participant Style as parse::decode_style
//!     participant Walk as parse::walk
//!     participant Coerce as parse::coerce
//!
//!     Host->>Req: from_request(&req, "/pets/{id}")
//!     Req-->>Host: raw values by location
//!     Host->>Style: decode_style(param, raw, limits)
//!     Style->>Style: split by style/explode<br/>or parse content JSON
//!     Style-->>Walk: Structural (string leaves)
//!     Walk->>Coerce: coerce_primitive(schema, leaf)
//!     Coerce-->>Walk: Integer / Date / Bytes / ...
//!     Walk-->>Host: Value, or ParameterError with path
//! ```
//!
//! A missing value falls back to the schema `default`, which is walked but
//! never style-decoded. A default that does not fit its schema is reported as
//! a broken definition (500) rather than a bad request (400).
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtparam::parse::decode_str;
//! use brrtparam::spec::{ParameterDefinition, ParameterLocation, ParameterStyle, SchemaNode};
//! use brrtparam::value::Value;
//!
//! let color = ParameterDefinition::new(
//!     "color",
//!     ParameterLocation::Query,
//!     SchemaNode::object([("R", SchemaNode::integer()), ("G", SchemaNode::integer())]),
//! )
//! .style(ParameterStyle::PipeDelimited);
//!
//! let value = decode_str(&color, "R|100|G|200").unwrap().unwrap();
//! assert_eq!(value.as_object().unwrap()["G"], Value::Integer(200));
//! ```
//!
//! Loading definitions from a document and decoding a request:
//!
//! ```rust,no_run
//! use brrtparam::request::{decode_parameters, RawParameters};
//! use brrtparam::runtime_config::DecodeLimits;
//! use brrtparam::spec::load_parameters;
//!
//! let operations = load_parameters("openapi.yaml")?;
//! let op = operations.iter().find(|op| op.matches("get_pet")).unwrap();
//! let raw = RawParameters::from_parts(&op.path, "/pets/5?tags=a,b", [("X-Trace", "abc")]);
//! let parsed = decode_parameters(&op.parameters, &raw, &DecodeLimits::from_env())?;
//! println!("{}", parsed.to_json());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Features
//!
//! - **All seven styles** - matrix, label, simple, form, spaceDelimited, pipeDelimited, deepObject
//! - **Content parameters** - JSON-family media types are parsed and walked against their schema
//! - **Rich formats** - `byte` (base64), `binary`, `date`, `date-time` with min/max bounds
//! - **Precise errors** - `The "ids" query parameter is invalid. Error at ids[2]. "3.5" is not a whole number.`
//! - **Bounded work** - nesting depth and item counts are capped (see [`runtime_config`])
//!
//! ## Configuration
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `BRRTR_PARAM_MAX_DEPTH` | `32` | Deepest array/object nesting |
//! | `BRRTR_PARAM_MAX_ITEMS` | `1024` | Largest array/object |
//! | `BRRTR_LOG_LEVEL` | `info` | Log level for the CLI |
//! | `BRRTR_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `BRRTR_LOG_REDACT_LEVEL` | `credentials` | `none`, `credentials` or `full` |

pub mod cli;
pub mod logging;
pub mod parse;
pub mod request;
pub mod runtime_config;
pub mod spec;
pub mod validator;
pub mod value;

pub use parse::{decode_parameter, decode_parameter_with_limits, decode_str, ParameterError, RawValue};
pub use request::{decode_parameters, ParsedParameters, RawParameters};
pub use spec::{
    load_parameters, OperationParameters, ParameterDefinition, ParameterLocation, ParameterStyle,
    SchemaNode,
};
pub use value::Value;
