use super::build::{build_operations, OperationParameters};
use crate::runtime_config::DecodeLimits;
use anyhow::Context;
use oas3::OpenApiV3Spec;
use serde_json::Value as Json;
use std::path::Path;

/// Serialization of an OpenAPI document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml`/`.yml` is YAML, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Drop path-item keys the OpenAPI model does not know, such as vendor verbs.
fn strip_unknown_verbs(val: &mut Json) {
    const METHODS: [&str; 8] = ["get", "post", "put", "delete", "patch", "options", "head", "trace"];

    let Some(Json::Object(paths_map)) = val.get_mut("paths") else {
        return;
    };
    for item in paths_map.values_mut() {
        if let Json::Object(obj) = item {
            obj.retain(|k, _| {
                let lk = k.to_ascii_lowercase();
                match lk.as_str() {
                    "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                    m if METHODS.contains(&m) => true,
                    _ => k.starts_with("x-"),
                }
            });
        }
    }
}

/// Copy of `doc` for the typed OpenAPI model, without parameter objects.
///
/// Parameters are built from the raw document, where a malformed one becomes
/// a reported issue instead of a failure of the whole document.
fn without_parameters(doc: &Json) -> Json {
    let mut typed = doc.clone();
    if let Some(Json::Object(components)) = typed.get_mut("components") {
        components.remove("parameters");
    }
    if let Some(Json::Object(paths_map)) = typed.get_mut("paths") {
        for item in paths_map.values_mut() {
            if let Json::Object(obj) = item {
                obj.remove("parameters");
                for operation in obj.values_mut() {
                    if let Json::Object(op) = operation {
                        op.remove("parameters");
                    }
                }
            }
        }
    }
    typed
}

/// Parse document text into its raw JSON form.
pub fn parse_document(content: &str, format: DocumentFormat) -> anyhow::Result<Json> {
    let mut value: Json = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(content).context("Invalid YAML document")?,
        DocumentFormat::Json => serde_json::from_str(content).context("Invalid JSON document")?,
    };
    strip_unknown_verbs(&mut value);
    Ok(value)
}

/// Build every operation's parameters from document text.
pub fn load_parameters_from_str(
    content: &str,
    format: DocumentFormat,
    limits: &DecodeLimits,
) -> anyhow::Result<Vec<OperationParameters>> {
    let doc = parse_document(content, format)?;
    let spec: OpenApiV3Spec =
        serde_json::from_value(without_parameters(&doc)).context("Document is not an OpenAPI 3 specification")?;
    build_operations(&spec, &doc, limits)
}

/// Load an OpenAPI document from disk and build every operation's parameters.
///
/// Limits come from the environment (see [`DecodeLimits::from_env`]).
pub fn load_parameters(file_path: impl AsRef<Path>) -> anyhow::Result<Vec<OperationParameters>> {
    load_parameters_with_limits(file_path, &DecodeLimits::from_env())
}

pub fn load_parameters_with_limits(
    file_path: impl AsRef<Path>,
    limits: &DecodeLimits,
) -> anyhow::Result<Vec<OperationParameters>> {
    let path = file_path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec file {}", path.display()))?;
    load_parameters_from_str(&content, DocumentFormat::from_path(path), limits)
        .with_context(|| format!("Failed to load parameters from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_unknown_verbs() {
        let mut v = json!({
            "paths": {
                "/x": { "get": {}, "patch": {}, "unknown": {}, "x-extra": {} }
            }
        });
        strip_unknown_verbs(&mut v);
        assert!(v["paths"]["/x"].get("unknown").is_none());
        assert!(v["paths"]["/x"].get("patch").is_some());
        assert!(v["paths"]["/x"].get("x-extra").is_some());
    }

    #[test]
    fn test_parameters_are_kept_out_of_the_typed_view() {
        let doc = json!({
            "components": { "parameters": { "P": {} }, "schemas": {} },
            "paths": {
                "/x": { "parameters": [], "get": { "parameters": [], "responses": {} } }
            }
        });
        let typed = without_parameters(&doc);
        assert!(typed["components"].get("parameters").is_none());
        assert!(typed["components"].get("schemas").is_some());
        assert!(typed["paths"]["/x"].get("parameters").is_none());
        assert!(typed["paths"]["/x"]["get"].get("parameters").is_none());
        assert!(doc["paths"]["/x"]["get"].get("parameters").is_some());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("api.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("api.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("api.json")), DocumentFormat::Json);
    }

    #[test]
    fn test_not_openapi_is_an_error() {
        let err = load_parameters_from_str("{\"hello\": 1}", DocumentFormat::Json, &DecodeLimits::default())
            .unwrap_err();
        assert!(err.to_string().contains("OpenAPI"));
    }
}
