use super::schema::SchemaNode;
use crate::value::Value;
use indexmap::IndexMap;
use std::str::FromStr;

/// Where on the request a parameter's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// A field of an `application/x-www-form-urlencoded` or multipart body
    FormData,
}

impl ParameterLocation {
    /// The OpenAPI `in` keyword for this location.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::FormData => "formData",
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(ParameterLocation::Path),
            "query" => Ok(ParameterLocation::Query),
            "header" => Ok(ParameterLocation::Header),
            "cookie" => Ok(ParameterLocation::Cookie),
            "formData" | "formdata" | "form" => Ok(ParameterLocation::FormData),
            other => Err(format!("unknown parameter location '{other}'")),
        }
    }
}

/// OpenAPI serialization style of a simple (non-`content`) parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    /// Style OpenAPI assumes when a parameter does not declare one.
    pub fn default_for(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Query | ParameterLocation::Cookie | ParameterLocation::FormData => {
                ParameterStyle::Form
            }
            ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
        }
    }

    /// `explode` defaults to true for `form` and false for everything else.
    pub fn default_explode(&self) -> bool {
        matches!(self, ParameterStyle::Form)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        }
    }
}

impl FromStr for ParameterStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matrix" => Ok(ParameterStyle::Matrix),
            "label" => Ok(ParameterStyle::Label),
            "form" => Ok(ParameterStyle::Form),
            "simple" => Ok(ParameterStyle::Simple),
            "spaceDelimited" => Ok(ParameterStyle::SpaceDelimited),
            "pipeDelimited" => Ok(ParameterStyle::PipeDelimited),
            "deepObject" => Ok(ParameterStyle::DeepObject),
            other => Err(format!("unknown parameter style '{other}'")),
        }
    }
}

impl std::fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the decoder needs to know about one parameter.
///
/// A *simple* parameter carries `schema` (and optionally `style`); a *complex*
/// parameter carries `content` instead, keyed by mime type. Only the first
/// `content` entry is consulted, as OpenAPI allows exactly one.
///
/// Definitions are immutable once built and shared read-only across decode calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    pub name: String,
    pub location: ParameterLocation,
    pub style: Option<ParameterStyle>,
    pub explode: bool,
    pub schema: Option<SchemaNode>,
    pub content: Option<IndexMap<String, SchemaNode>>,
    pub required: bool,
    /// Typed default from the schema's `default` keyword
    pub default: Option<Value>,
}

impl ParameterDefinition {
    /// A simple parameter with the location's default style and explode flag.
    pub fn new(name: impl Into<String>, location: ParameterLocation, schema: SchemaNode) -> Self {
        let style = ParameterStyle::default_for(location);
        ParameterDefinition {
            name: name.into(),
            location,
            style: Some(style),
            explode: style.default_explode(),
            schema: Some(schema),
            content: None,
            required: location == ParameterLocation::Path,
            default: None,
        }
    }

    /// A complex parameter whose value is a serialized `mime_type` document.
    pub fn with_content(
        name: impl Into<String>,
        location: ParameterLocation,
        mime_type: impl Into<String>,
        schema: SchemaNode,
    ) -> Self {
        let mut content = IndexMap::new();
        content.insert(mime_type.into(), schema);
        ParameterDefinition {
            name: name.into(),
            location,
            style: None,
            explode: false,
            schema: None,
            content: Some(content),
            required: location == ParameterLocation::Path,
            default: None,
        }
    }

    /// Set the style; explode is reset to that style's default.
    #[must_use]
    pub fn style(mut self, style: ParameterStyle) -> Self {
        self.style = Some(style);
        self.explode = style.default_explode();
        self
    }

    #[must_use]
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Declared style, or the location's default.
    pub fn effective_style(&self) -> ParameterStyle {
        self.style
            .unwrap_or_else(|| ParameterStyle::default_for(self.location))
    }

    /// The first `content` entry, if this is a complex parameter.
    pub fn content_schema(&self) -> Option<(&str, &SchemaNode)> {
        self.content
            .as_ref()
            .and_then(|c| c.first())
            .map(|(mime, schema)| (mime.as_str(), schema))
    }

    /// Schema that decoded values are walked against.
    pub fn value_schema(&self) -> Option<&SchemaNode> {
        self.content_schema()
            .map(|(_, schema)| schema)
            .or(self.schema.as_ref())
    }

    pub fn is_complex(&self) -> bool {
        self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_by_location() {
        assert_eq!(
            ParameterStyle::default_for(ParameterLocation::Query),
            ParameterStyle::Form
        );
        assert_eq!(
            ParameterStyle::default_for(ParameterLocation::Header),
            ParameterStyle::Simple
        );
        assert!(ParameterStyle::Form.default_explode());
        assert!(!ParameterStyle::Matrix.default_explode());
    }

    #[test]
    fn test_style_round_trips_through_str() {
        for style in [
            ParameterStyle::Matrix,
            ParameterStyle::SpaceDelimited,
            ParameterStyle::DeepObject,
        ] {
            assert_eq!(style.as_str().parse::<ParameterStyle>(), Ok(style));
        }
        assert!("tsv".parse::<ParameterStyle>().is_err());
    }

    #[test]
    fn test_builder_resets_explode_with_style() {
        let p = ParameterDefinition::new("id", ParameterLocation::Query, SchemaNode::string())
            .style(ParameterStyle::Simple);
        assert!(!p.explode);
        assert_eq!(p.effective_style(), ParameterStyle::Simple);
    }

    #[test]
    fn test_content_schema_lookup() {
        let p = ParameterDefinition::with_content(
            "filter",
            ParameterLocation::Query,
            "application/json",
            SchemaNode::object([("a", SchemaNode::integer())]),
        );
        let (mime, schema) = p.content_schema().unwrap();
        assert_eq!(mime, "application/json");
        assert_eq!(schema.type_name(), "object");
        assert!(p.is_complex());
    }
}
