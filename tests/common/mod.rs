#![allow(dead_code)]

use brrtparam::spec::{
    load_parameters_from_str, DocumentFormat, OperationParameters, ParameterDefinition,
    ParameterLocation, ParameterStyle, SchemaNode,
};
use brrtparam::runtime_config::DecodeLimits;
use std::io::Write;

/// A query parameter with an explicit style and explode flag.
pub fn query(name: &str, schema: SchemaNode, style: ParameterStyle, explode: bool) -> ParameterDefinition {
    ParameterDefinition::new(name, ParameterLocation::Query, schema)
        .style(style)
        .explode(explode)
}

pub fn string_array() -> SchemaNode {
    SchemaNode::array(SchemaNode::string())
}

pub fn integer_array() -> SchemaNode {
    SchemaNode::array(SchemaNode::integer())
}

/// Build operations from inline YAML.
pub fn operations_from_yaml(yaml: &str) -> Vec<OperationParameters> {
    load_parameters_from_str(yaml, DocumentFormat::Yaml, &DecodeLimits::default())
        .expect("failed to load spec")
}

pub fn operation<'a>(operations: &'a [OperationParameters], key: &str) -> &'a OperationParameters {
    operations
        .iter()
        .find(|op| op.matches(key))
        .unwrap_or_else(|| panic!("operation {key} not found"))
}

/// Write `content` to a temporary file with the given extension.
pub fn temp_spec(content: &str, ext: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("brrtparam_test_")
        .suffix(&format!(".{ext}"))
        .tempfile()
        .expect("failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("failed to write temp spec");
    file
}
