//! Request-level extraction: pull each declared parameter's raw value out of
//! an HTTP request and decode the whole set.

use crate::parse::{decode_parameter_with_limits, ParameterError, RawValue};
use crate::runtime_config::DecodeLimits;
use crate::spec::{ParameterDefinition, ParameterLocation, ParameterStyle, SchemaNode};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Parse cookies from the `cookie` header
///
/// # Arguments
///
/// * `headers` - Request headers with lowercase names
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name.to_string(), value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a query string (without the leading `?`).
///
/// Keys and values are URL-decoded. A key that occurs more than once keeps
/// every value, in order, as [`RawValue::Repeated`].
pub fn parse_query_params(query: &str) -> IndexMap<String, RawValue> {
    let mut out: IndexMap<String, RawValue> = IndexMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match out.get_mut(key.as_ref()) {
            Some(existing) => existing.push(value.into_owned()),
            None => {
                out.insert(key.into_owned(), RawValue::Single(value.into_owned()));
            }
        }
    }
    out
}

/// Match a concrete path against a template like `/pets/{id}`.
///
/// Returns the percent-decoded value of every `{param}` segment, or `None`
/// when the path does not fit the template.
pub fn match_path_params(template: &str, path: &str) -> Option<HashMap<String, String>> {
    let template_segments: Vec<&str> = template.trim_end_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::with_capacity(template.matches('{').count());
    for (expected, actual) in template_segments.iter().zip(&path_segments) {
        if let Some(name) = expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            let decoded = urlencoding::decode(actual).ok()?;
            params.insert(name.to_string(), decoded.into_owned());
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}

/// Keep the `&`-separated segments of `query` whose decoded key passes `keep`.
fn filter_query(query: &str, keep: impl Fn(&str) -> bool) -> String {
    query
        .split('&')
        .filter(|segment| {
            url::form_urlencoded::parse(segment.as_bytes())
                .next()
                .is_some_and(|(key, _)| keep(&key))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Everything a request carried, grouped by parameter location.
#[derive(Debug, Clone, Default)]
pub struct RawParameters {
    pub path: HashMap<String, String>,
    pub query: IndexMap<String, RawValue>,
    /// Original query string, for styles that spread one parameter over many keys
    pub query_string: String,
    /// Header values keyed by lowercase name
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub form: IndexMap<String, RawValue>,
    pub form_string: String,
}

impl RawParameters {
    /// Collect raw values from a URL (path plus optional query) and headers.
    ///
    /// `template` is the operation's path template; path parameters stay empty
    /// when the URL does not match it.
    pub fn from_parts<K, V>(
        template: &str,
        url: &str,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let mut header_map: HashMap<String, String> = HashMap::new();
        for (name, value) in headers {
            let name = name.as_ref().to_ascii_lowercase();
            let value = value.as_ref().trim();
            header_map
                .entry(name.clone())
                .and_modify(|existing| {
                    existing.push_str(if name == "cookie" { "; " } else { ", " });
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        RawParameters {
            path: match_path_params(template, path).unwrap_or_default(),
            query: parse_query_params(query),
            query_string: query.to_string(),
            cookies: parse_cookies(&header_map),
            headers: header_map,
            form: IndexMap::new(),
            form_string: String::new(),
        }
    }

    /// Collect raw values from an [`http::Request`].
    pub fn from_request<B>(req: &http::Request<B>, template: &str) -> Self {
        let url = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let headers = req
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)));
        Self::from_parts(template, url, headers)
    }

    /// Attach an `application/x-www-form-urlencoded` body for `formData` parameters.
    #[must_use]
    pub fn with_form_body(mut self, body: &str) -> Self {
        self.form = parse_query_params(body);
        self.form_string = body.to_string();
        self
    }

    /// The raw value `param` would decode from, or `None` if the request did not carry it.
    pub fn raw_value(&self, param: &ParameterDefinition) -> Option<RawValue> {
        match param.location {
            ParameterLocation::Path => self.path.get(&param.name).cloned().map(RawValue::Single),
            ParameterLocation::Header => self
                .headers
                .get(&param.name.to_ascii_lowercase())
                .cloned()
                .map(RawValue::Single),
            ParameterLocation::Cookie => {
                self.cookies.get(&param.name).cloned().map(RawValue::Single)
            }
            ParameterLocation::Query => spread_value(param, &self.query, &self.query_string),
            ParameterLocation::FormData => spread_value(param, &self.form, &self.form_string),
        }
    }
}

/// Look up a query/form parameter. Exploded objects are spread over several
/// keys, so those get the matching part of the original string instead.
fn spread_value(
    param: &ParameterDefinition,
    by_key: &IndexMap<String, RawValue>,
    original: &str,
) -> Option<RawValue> {
    let properties = match (param.is_complex(), &param.schema) {
        (false, Some(SchemaNode::ObjectOf(properties))) => properties,
        _ => return by_key.get(&param.name).cloned(),
    };

    let filtered = match param.effective_style() {
        ParameterStyle::DeepObject => {
            let prefix = format!("{}[", param.name);
            filter_query(original, |key| key.starts_with(&prefix))
        }
        ParameterStyle::Form if param.explode => {
            if properties.is_empty() {
                original.to_string()
            } else {
                filter_query(original, |key| properties.contains_key(key))
            }
        }
        _ => return by_key.get(&param.name).cloned(),
    };

    if filtered.is_empty() {
        None
    } else {
        Some(RawValue::Single(filtered))
    }
}

/// Decoded parameters of one request, grouped by location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedParameters {
    pub path: IndexMap<String, Value>,
    pub query: IndexMap<String, Value>,
    pub header: IndexMap<String, Value>,
    pub cookie: IndexMap<String, Value>,
    pub form: IndexMap<String, Value>,
}

impl ParsedParameters {
    fn bucket_mut(&mut self, location: ParameterLocation) -> &mut IndexMap<String, Value> {
        match location {
            ParameterLocation::Path => &mut self.path,
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.header,
            ParameterLocation::Cookie => &mut self.cookie,
            ParameterLocation::FormData => &mut self.form,
        }
    }

    pub fn get(&self, location: ParameterLocation, name: &str) -> Option<&Value> {
        let bucket = match location {
            ParameterLocation::Path => &self.path,
            ParameterLocation::Query => &self.query,
            ParameterLocation::Header => &self.header,
            ParameterLocation::Cookie => &self.cookie,
            ParameterLocation::FormData => &self.form,
        };
        bucket.get(name)
    }

    pub fn len(&self) -> usize {
        self.path.len() + self.query.len() + self.header.len() + self.cookie.len() + self.form.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `{"path": {...}, "query": {...}, ...}`; empty locations are omitted.
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for (location, bucket) in [
            (ParameterLocation::Path, &self.path),
            (ParameterLocation::Query, &self.query),
            (ParameterLocation::Header, &self.header),
            (ParameterLocation::Cookie, &self.cookie),
            (ParameterLocation::FormData, &self.form),
        ] {
            if bucket.is_empty() {
                continue;
            }
            let values = bucket
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect();
            out.insert(location.as_str().to_string(), serde_json::Value::Object(values));
        }
        serde_json::Value::Object(out)
    }
}

/// Decode every declared parameter of an operation.
///
/// Stops at the first failure. A required parameter that is absent and has
/// no default is [`ParameterError::MissingRequired`].
pub fn decode_parameters(
    params: &[ParameterDefinition],
    raw: &RawParameters,
    limits: &DecodeLimits,
) -> Result<ParsedParameters, ParameterError> {
    let mut parsed = ParsedParameters::default();
    for param in params {
        let value = raw.raw_value(param);
        match decode_parameter_with_limits(param, value.as_ref(), limits)? {
            Some(decoded) => {
                parsed.bucket_mut(param.location).insert(param.name.clone(), decoded);
            }
            None if param.required => {
                debug!(param = %param.name, location = %param.location, "required parameter missing");
                return Err(ParameterError::missing(param));
            }
            None => {}
        }
    }
    debug!(count = parsed.len(), "request parameters decoded");
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let mut headers = HashMap::new();
        headers.insert("cookie".to_string(), "a=1; b=two=2; ;c".to_string());
        let cookies = parse_cookies(&headers);
        assert_eq!(cookies.get("a"), Some(&"1".to_string()));
        assert_eq!(cookies.get("b"), Some(&"two=2".to_string()));
        assert_eq!(cookies.get("c"), Some(&String::new()));
        assert_eq!(cookies.len(), 3);
    }

    #[test]
    fn test_parse_query_params_keeps_repeats() {
        let query = parse_query_params("id=1&id=2&name=a%20b&id=3");
        assert_eq!(
            query.get("id"),
            Some(&RawValue::Repeated(vec!["1".into(), "2".into(), "3".into()]))
        );
        assert_eq!(query.get("name"), Some(&RawValue::Single("a b".into())));
    }

    #[test]
    fn test_match_path_params() {
        let params = match_path_params("/pets/{id}/toys/{toy}", "/pets/a%2Cb/toys/7").unwrap();
        assert_eq!(params["id"], "a,b");
        assert_eq!(params["toy"], "7");
        assert!(match_path_params("/pets/{id}", "/owners/1").is_none());
        assert!(match_path_params("/pets/{id}", "/pets/1/extra").is_none());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let raw = RawParameters::from_parts("/", "/", [("X-Request-Id", "abc")]);
        let param = ParameterDefinition::new(
            "x-request-id",
            ParameterLocation::Header,
            SchemaNode::string(),
        );
        assert_eq!(raw.raw_value(&param), Some(RawValue::Single("abc".into())));
    }

    #[test]
    fn test_deep_object_sees_only_its_keys() {
        let raw = RawParameters::from_parts(
            "/",
            "/?filter%5Bcolor%5D=red&page=2&filter[size]=3",
            std::iter::empty::<(&str, &str)>(),
        );
        let param = ParameterDefinition::new(
            "filter",
            ParameterLocation::Query,
            SchemaNode::object([("color", SchemaNode::string())]),
        )
        .style(ParameterStyle::DeepObject);
        assert_eq!(
            raw.raw_value(&param),
            Some(RawValue::Single("filter%5Bcolor%5D=red&filter[size]=3".into()))
        );
    }

    #[test]
    fn test_exploded_form_object_uses_declared_properties() {
        let raw = RawParameters::from_parts(
            "/",
            "/?R=100&page=2&G=200",
            std::iter::empty::<(&str, &str)>(),
        );
        let param = ParameterDefinition::new(
            "color",
            ParameterLocation::Query,
            SchemaNode::object([("R", SchemaNode::integer()), ("G", SchemaNode::integer())]),
        );
        assert_eq!(raw.raw_value(&param), Some(RawValue::Single("R=100&G=200".into())));
    }

    #[test]
    fn test_missing_required_parameter() {
        let params = vec![ParameterDefinition::new(
            "Test",
            ParameterLocation::Header,
            SchemaNode::string(),
        )
        .required(true)];
        let raw = RawParameters::from_parts("/", "/", std::iter::empty::<(&str, &str)>());
        let err = decode_parameters(&params, &raw, &DecodeLimits::default()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required header parameter \"Test\".");
    }

    #[test]
    fn test_decode_parameters_groups_by_location() {
        let params = vec![
            ParameterDefinition::new("id", ParameterLocation::Path, SchemaNode::integer()),
            ParameterDefinition::new("verbose", ParameterLocation::Query, SchemaNode::boolean()),
            ParameterDefinition::new("limit", ParameterLocation::Query, SchemaNode::integer())
                .default_value(10_i64),
        ];
        let raw = RawParameters::from_parts(
            "/items/{id}",
            "/items/42?verbose=TRUE",
            std::iter::empty::<(&str, &str)>(),
        );
        let parsed = decode_parameters(&params, &raw, &DecodeLimits::default()).unwrap();
        assert_eq!(parsed.get(ParameterLocation::Path, "id"), Some(&Value::Integer(42)));
        assert_eq!(
            parsed.get(ParameterLocation::Query, "verbose"),
            Some(&Value::Boolean(true))
        );
        assert_eq!(parsed.get(ParameterLocation::Query, "limit"), Some(&Value::Integer(10)));
        assert_eq!(
            parsed.to_json(),
            serde_json::json!({"path": {"id": 42}, "query": {"verbose": true, "limit": 10}})
        );
    }

    #[test]
    fn test_from_http_request() {
        let req = http::Request::builder()
            .uri("/pets/5?tags=a&tags=b")
            .header("Cookie", "session=xyz")
            .body(())
            .unwrap();
        let raw = RawParameters::from_request(&req, "/pets/{id}");
        assert_eq!(raw.path["id"], "5");
        assert_eq!(raw.cookies["session"], "xyz");
        assert!(matches!(raw.query.get("tags"), Some(RawValue::Repeated(v)) if v.len() == 2));
    }
}
