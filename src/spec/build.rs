use super::schema::SchemaNode;
use super::types::{ParameterDefinition, ParameterLocation, ParameterStyle};
use crate::parse::SchemaError;
use crate::runtime_config::DecodeLimits;
use crate::validator::{fail_if_issues, ValidationIssue};
use crate::value::Value;
use http::Method;
use indexmap::IndexMap;
use oas3::OpenApiV3Spec;
use serde::Deserialize;
use serde_json::Value as Json;

/// The parameters one operation accepts, path-level parameters merged in.
#[derive(Debug, Clone)]
pub struct OperationParameters {
    pub operation_id: Option<String>,
    pub method: Method,
    /// Path template, e.g. `/pets/{id}`
    pub path: String,
    pub parameters: Vec<ParameterDefinition>,
}

impl OperationParameters {
    /// `operationId`, or `METHOD /path` when the operation has none.
    pub fn display_name(&self) -> String {
        self.operation_id
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }

    pub fn find(&self, name: &str, location: ParameterLocation) -> Option<&ParameterDefinition> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }

    /// Whether `key` selects this operation, by `operationId` or `METHOD /path`.
    pub fn matches(&self, key: &str) -> bool {
        if self.operation_id.as_deref() == Some(key) {
            return true;
        }
        match key.split_once(' ') {
            Some((method, path)) => {
                method.eq_ignore_ascii_case(self.method.as_str()) && path.trim() == self.path
            }
            None => false,
        }
    }
}

/// Parameter object as written in the document.
///
/// Read straight from JSON rather than through `oas3::spec::Parameter` so
/// that `content` and unrecognised style names survive to be reported.
#[derive(Debug, Deserialize)]
struct ParameterShim {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(default)]
    required: bool,
    style: Option<String>,
    explode: Option<bool>,
    schema: Option<Json>,
    content: Option<IndexMap<String, MediaTypeShim>>,
}

#[derive(Debug, Deserialize)]
struct MediaTypeShim {
    #[serde(default)]
    schema: Option<Json>,
}

/// Resolve a local `$ref` such as `#/components/parameters/Limit`.
pub fn resolve_ref<'a>(doc: &'a Json, ref_path: &str) -> Option<&'a Json> {
    ref_path.strip_prefix('#').and_then(|pointer| doc.pointer(pointer))
}

/// Replace every local `$ref` in `value` with its target.
///
/// `max_chain` bounds how many references may be followed inside one another,
/// which also stops self-referencing schemas.
pub fn expand_refs(doc: &Json, value: &mut Json, max_chain: usize) -> Result<(), SchemaError> {
    expand_refs_inner(doc, value, 0, max_chain)
}

fn expand_refs_inner(
    doc: &Json,
    value: &mut Json,
    chain: usize,
    max_chain: usize,
) -> Result<(), SchemaError> {
    match value {
        Json::Object(obj) => {
            if let Some(ref_path) = obj.get("$ref").and_then(|v| v.as_str()) {
                if chain >= max_chain {
                    return Err(SchemaError::TooDeep { limit: max_chain });
                }
                if let Some(target) = resolve_ref(doc, ref_path) {
                    let mut resolved = target.clone();
                    expand_refs_inner(doc, &mut resolved, chain + 1, max_chain)?;
                    *value = resolved;
                    return Ok(());
                }
            }
            for v in obj.values_mut() {
                expand_refs_inner(doc, v, chain, max_chain)?;
            }
        }
        Json::Array(arr) => {
            for v in arr.iter_mut() {
                expand_refs_inner(doc, v, chain, max_chain)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Escape a key for use in a JSON pointer (RFC 6901).
fn pointer_escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn raw_parameters<'a>(doc: &'a Json, pointer: &str) -> &'a [Json] {
    doc.pointer(pointer)
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Build one parameter definition from its (possibly `$ref`) JSON object.
pub fn build_parameter(
    doc: &Json,
    raw: &Json,
    limits: &DecodeLimits,
) -> Result<ParameterDefinition, ValidationIssue> {
    let mut raw = raw.clone();
    let label = raw
        .get("name")
        .or_else(|| raw.get("$ref"))
        .and_then(|v| v.as_str())
        .unwrap_or("<unnamed>")
        .to_string();
    let schema_issue = |e: SchemaError| ValidationIssue::new(&label, "InvalidSchema", e.to_string());

    expand_refs(doc, &mut raw, limits.max_depth).map_err(schema_issue)?;
    if raw.get("$ref").is_some() {
        return Err(ValidationIssue::new(&label, "UnresolvedRef", "Parameter $ref does not resolve"));
    }

    let shim: ParameterShim = serde_json::from_value(raw)
        .map_err(|e| ValidationIssue::new(&label, "InvalidParameter", e.to_string()))?;
    let label = format!("{} ({})", shim.name, shim.location);
    let schema_issue = |e: SchemaError| ValidationIssue::new(&label, "InvalidSchema", e.to_string());

    let location: ParameterLocation = shim
        .location
        .parse()
        .map_err(|e: String| ValidationIssue::new(&label, "InvalidParameter", e))?;
    let required = shim.required || location == ParameterLocation::Path;

    let mut definition = match (shim.schema, shim.content) {
        (Some(_), Some(_)) => {
            return Err(ValidationIssue::new(
                &label,
                "InvalidParameter",
                "Parameter cannot specify both 'schema' and 'content'",
            ))
        }
        (None, None) => return Err(schema_issue(SchemaError::MissingSchema)),
        (Some(schema_json), None) => {
            let schema = SchemaNode::from_json_with_depth(&schema_json, limits.max_depth)
                .map_err(schema_issue)?;
            let style = match shim.style {
                Some(name) => name
                    .parse::<ParameterStyle>()
                    .map_err(|_| schema_issue(SchemaError::UnknownStyle { style: name }))?,
                None => ParameterStyle::default_for(location),
            };
            if style == ParameterStyle::DeepObject && !matches!(schema, SchemaNode::ObjectOf(_)) {
                return Err(schema_issue(SchemaError::StyleMismatch {
                    style,
                    schema_type: schema.type_name(),
                }));
            }
            let mut definition = ParameterDefinition::new(shim.name, location, schema)
                .style(style)
                .required(required);
            definition.explode = shim.explode.unwrap_or_else(|| style.default_explode());
            definition.default = schema_json.get("default").cloned().map(Value::from);
            definition
        }
        (None, Some(content)) => {
            let Some((mime, media)) = content.into_iter().next() else {
                return Err(ValidationIssue::new(
                    &label,
                    "InvalidParameter",
                    "Parameter has an empty 'content' map",
                ));
            };
            let schema_json = media.schema.unwrap_or_else(|| Json::Object(Default::default()));
            // A content schema without a type accepts the decoded document as is.
            let schema = if schema_json.as_object().is_some_and(|o| o.is_empty()) {
                SchemaNode::string()
            } else {
                SchemaNode::from_json_with_depth(&schema_json, limits.max_depth)
                    .map_err(schema_issue)?
            };
            let mut definition = ParameterDefinition::with_content(shim.name, location, mime, schema)
                .required(required);
            definition.default = schema_json.get("default").cloned().map(Value::from);
            definition
        }
    };
    definition.required = required;
    Ok(definition)
}

/// Path-level parameters first, then operation-level ones; an operation
/// parameter replaces the path parameter with the same name and location.
fn merge_parameters(
    path_level: &[ParameterDefinition],
    operation_level: Vec<ParameterDefinition>,
) -> Vec<ParameterDefinition> {
    let mut merged = path_level.to_vec();
    for param in operation_level {
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }
    merged
}

fn build_all(
    doc: &Json,
    pointer: &str,
    location: &str,
    limits: &DecodeLimits,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<ParameterDefinition> {
    raw_parameters(doc, pointer)
        .iter()
        .filter_map(|raw| match build_parameter(doc, raw, limits) {
            Ok(param) => Some(param),
            Err(issue) => {
                issues.push(issue.within(location));
                None
            }
        })
        .collect()
}

/// Build the parameter definitions of every operation in the document.
///
/// `doc` is the raw JSON form of `spec`; parameters are read from it so that
/// nothing the typed model drops is lost. Every broken parameter is collected
/// and reported together.
pub fn build_operations(
    spec: &OpenApiV3Spec,
    doc: &Json,
    limits: &DecodeLimits,
) -> anyhow::Result<Vec<OperationParameters>> {
    let mut operations = Vec::new();
    let mut issues = Vec::new();

    if let Some(paths_map) = spec.paths.as_ref() {
        for (path, item) in paths_map {
            let path_pointer = format!("/paths/{}", pointer_escape(path));
            let path_params = build_all(
                doc,
                &format!("{path_pointer}/parameters"),
                path,
                limits,
                &mut issues,
            );

            for (method, operation) in item.methods() {
                let location = format!("{path} → {method}");
                let op_params = build_all(
                    doc,
                    &format!(
                        "{path_pointer}/{}/parameters",
                        method.as_str().to_ascii_lowercase()
                    ),
                    &location,
                    limits,
                    &mut issues,
                );

                operations.push(OperationParameters {
                    operation_id: operation.operation_id.clone(),
                    method: method.clone(),
                    path: path.clone(),
                    parameters: merge_parameters(&path_params, op_params),
                });
            }
        }
    }

    fail_if_issues(issues)?;
    Ok(operations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(raw: Json) -> Result<ParameterDefinition, ValidationIssue> {
        build_parameter(&json!({}), &raw, &DecodeLimits::default())
    }

    #[test]
    fn test_defaults_follow_location() {
        let p = build(json!({"name": "id", "in": "path", "schema": {"type": "integer"}})).unwrap();
        assert_eq!(p.style, Some(ParameterStyle::Simple));
        assert!(!p.explode);
        assert!(p.required);

        let q = build(json!({"name": "tags", "in": "query", "schema": {"type": "array"}})).unwrap();
        assert_eq!(q.style, Some(ParameterStyle::Form));
        assert!(q.explode);
        assert!(!q.required);
    }

    #[test]
    fn test_explicit_explode_wins() {
        let p = build(json!({
            "name": "tags", "in": "query", "style": "form", "explode": false,
            "schema": {"type": "array", "items": {"type": "string"}}
        }))
        .unwrap();
        assert!(!p.explode);
    }

    #[test]
    fn test_default_comes_from_schema() {
        let p = build(json!({
            "name": "limit", "in": "query",
            "schema": {"type": "integer", "default": 20}
        }))
        .unwrap();
        assert_eq!(p.default, Some(Value::Integer(20)));
    }

    #[test]
    fn test_content_parameter() {
        let p = build(json!({
            "name": "filter", "in": "query",
            "content": {"application/json": {"schema": {"type": "object"}}}
        }))
        .unwrap();
        assert!(p.is_complex());
        assert_eq!(p.content_schema().map(|(m, _)| m), Some("application/json"));
    }

    #[test]
    fn test_unknown_style_is_reported() {
        let issue = build(json!({
            "name": "q", "in": "query", "style": "tsv", "schema": {"type": "string"}
        }))
        .unwrap_err();
        assert_eq!(issue.kind, "InvalidSchema");
        assert!(issue.message.contains("\"tsv\""));
    }

    #[test]
    fn test_deep_object_requires_object_schema() {
        let issue = build(json!({
            "name": "q", "in": "query", "style": "deepObject", "schema": {"type": "string"}
        }))
        .unwrap_err();
        assert!(issue.message.contains("deepObject"));
    }

    #[test]
    fn test_refs_are_resolved() {
        let doc = json!({
            "components": {
                "parameters": {
                    "Limit": {"name": "limit", "in": "query", "schema": {"$ref": "#/components/schemas/Count"}}
                },
                "schemas": {"Count": {"type": "integer", "default": 10}}
            }
        });
        let p = build_parameter(
            &doc,
            &json!({"$ref": "#/components/parameters/Limit"}),
            &DecodeLimits::default(),
        )
        .unwrap();
        assert_eq!(p.name, "limit");
        assert_eq!(p.default, Some(Value::Integer(10)));
    }

    #[test]
    fn test_cyclic_ref_is_bounded() {
        let doc = json!({
            "components": {"schemas": {"Node": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}}}
        });
        let issue = build_parameter(
            &doc,
            &json!({"name": "n", "in": "query", "schema": {"$ref": "#/components/schemas/Node"}}),
            &DecodeLimits::default(),
        )
        .unwrap_err();
        assert_eq!(issue.kind, "InvalidSchema");
    }

    #[test]
    fn test_operation_parameters_override_path_parameters() {
        let path_level = vec![ParameterDefinition::new(
            "id",
            ParameterLocation::Path,
            SchemaNode::string(),
        )];
        let op_level = vec![
            ParameterDefinition::new("id", ParameterLocation::Path, SchemaNode::integer()),
            ParameterDefinition::new("id", ParameterLocation::Query, SchemaNode::string()),
        ];
        let merged = merge_parameters(&path_level, op_level);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].schema, Some(SchemaNode::integer()));
    }

    #[test]
    fn test_pointer_escape() {
        assert_eq!(pointer_escape("/pets/{id}"), "~1pets~1{id}");
        assert_eq!(pointer_escape("a~b"), "a~0b");
    }
}
