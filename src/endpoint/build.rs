use super::nest::nest_parameters;
use super::types::{
    json_type_name, AuthInfo, EndpointRecord, ExampleValue, FileRef, Metadata, Parameter,
    ParameterKind, RawEndpoint, RawParameter, RawResponseField, ResponseFieldDescription,
};
use crate::error::ValidationError;
use http::Method;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Matches `{name}` and `{name?}` path placeholders
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\??\}").expect("placeholder pattern is valid"));

const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Parse and deduplicate the raw method list
///
/// Routing layers add an implicit HEAD alongside every GET route; that entry
/// is stripped unless it is the only method (a sole HEAD was intentional).
///
/// # Arguments
///
/// * `raw` - Method strings as extracted from the route
///
/// # Returns
///
/// The ordered, deduplicated method list
pub fn dedup_methods(raw: &[String]) -> Result<Vec<Method>, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::InvalidShape {
            field: "methods".to_string(),
            expected: "at least one HTTP method",
            found: "empty list".to_string(),
        });
    }
    let mut methods: Vec<Method> = Vec::with_capacity(raw.len());
    for entry in raw {
        let method = Method::from_bytes(entry.to_ascii_uppercase().as_bytes()).map_err(|_| {
            ValidationError::InvalidMethod {
                value: entry.clone(),
            }
        })?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    if methods.len() == 1 {
        return Ok(methods);
    }
    Ok(methods.into_iter().filter(|m| *m != Method::HEAD).collect())
}

/// Materialize one raw parameter into its typed form
///
/// The file/list shape of the example value is decided here, once, from the
/// declared type; later partitioning and nesting only match on the tag.
fn materialize_parameter(name: &str, raw: &RawParameter) -> Result<Parameter, ValidationError> {
    let kind = ParameterKind::parse(raw.kind.as_deref().unwrap_or("string"), name)?;
    let example = match &raw.example {
        None | Some(Value::Null) => None,
        Some(value) => Some(materialize_example(name, &kind, value)?),
    };
    Ok(Parameter {
        name: name.to_string(),
        kind,
        description: raw.description.clone(),
        example,
        required: raw.required,
    })
}

fn materialize_example(
    field: &str,
    kind: &ParameterKind,
    value: &Value,
) -> Result<ExampleValue, ValidationError> {
    match kind {
        ParameterKind::File => Ok(ExampleValue::File(FileRef::from_value(field, value)?)),
        ParameterKind::Array { element } => {
            let items = value
                .as_array()
                .ok_or_else(|| ValidationError::InvalidShape {
                    field: field.to_string(),
                    expected: "array example",
                    found: json_type_name(value).to_string(),
                })?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(match element {
                    Some(inner) => materialize_example(field, inner, item)?,
                    None => ExampleValue::Scalar(item.clone()),
                });
            }
            Ok(ExampleValue::List(out))
        }
        _ => Ok(ExampleValue::Scalar(value.clone())),
    }
}

fn materialize_group(
    raw: &IndexMap<String, RawParameter>,
) -> Result<IndexMap<String, Parameter>, ValidationError> {
    let mut out = IndexMap::with_capacity(raw.len());
    for (name, param) in raw {
        out.insert(name.clone(), materialize_parameter(name, param)?);
    }
    Ok(out)
}

fn materialize_response_fields(
    raw: &IndexMap<String, RawResponseField>,
) -> Result<IndexMap<String, ResponseFieldDescription>, ValidationError> {
    let mut out = IndexMap::with_capacity(raw.len());
    for (name, field) in raw {
        out.insert(
            name.clone(),
            ResponseFieldDescription {
                name: name.clone(),
                kind: ParameterKind::parse(field.kind.as_deref().unwrap_or("string"), name)?,
                description: field.description.clone(),
            },
        );
    }
    Ok(out)
}

/// Derive the example-value-only projection of a parameter group
///
/// Parameters without an example are dropped; these are the values actually
/// substitutable into a request.
pub fn clean_parameters(group: &IndexMap<String, Parameter>) -> IndexMap<String, ExampleValue> {
    group
        .iter()
        .filter_map(|(name, param)| param.example.clone().map(|example| (name.clone(), example)))
        .collect()
}

fn scalar_to_string(example: &ExampleValue) -> Option<String> {
    match example {
        ExampleValue::Scalar(Value::String(s)) => Some(s.clone()),
        ExampleValue::Scalar(Value::Number(n)) => Some(n.to_string()),
        ExampleValue::Scalar(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Substitute clean url-parameter examples into the URI template
///
/// `{id}` and `{id?}` segments are replaced by the matching scalar example;
/// placeholders without one stay verbatim.
pub fn bind_uri(uri: &str, clean_url: &IndexMap<String, ExampleValue>) -> String {
    PLACEHOLDER
        .replace_all(uri, |caps: &regex::Captures| {
            match clean_url.get(&caps[1]).and_then(scalar_to_string) {
                Some(value) => value,
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Split the clean body map into regular values and upload files
///
/// Every entry lands in exactly one of the two maps.
fn partition_file_parameters(
    clean_body: IndexMap<String, ExampleValue>,
) -> (IndexMap<String, ExampleValue>, IndexMap<String, ExampleValue>) {
    let mut regular = IndexMap::new();
    let mut files = IndexMap::new();
    for (name, example) in clean_body {
        if example.is_file_like() {
            files.insert(name, example);
        } else {
            regular.insert(name, example);
        }
    }
    (regular, files)
}

fn parse_auth(raw: &[Value]) -> Result<Option<AuthInfo>, ValidationError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if raw.len() != 3 {
        return Err(ValidationError::InvalidShape {
            field: "auth".to_string(),
            expected: "[location, name, example] triple",
            found: format!("list of {}", raw.len()),
        });
    }
    let as_str = |index: usize, what: &'static str| {
        raw[index]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ValidationError::InvalidShape {
                field: "auth".to_string(),
                expected: what,
                found: json_type_name(&raw[index]).to_string(),
            })
    };
    Ok(Some(AuthInfo {
        location: as_str(0, "location string")?,
        name: as_str(1, "name string")?,
        example: raw[2].clone(),
    }))
}

/// Check required keys and top-level value shapes before deserializing
///
/// Deserializer messages for untyped input do not carry field names, so the
/// shapes the error contract cares about are verified up front.
fn validate_top_level_shape(value: &Value) -> Result<(), ValidationError> {
    for required in ["methods", "uri"] {
        if value.get(required).is_none() {
            return Err(ValidationError::MissingField {
                field: required.to_string(),
            });
        }
    }
    let shape_of = |field: &str| {
        json_type_name(value.get(field).unwrap_or(&Value::Null)).to_string()
    };
    let methods = &value["methods"];
    match methods.as_array() {
        None => {
            return Err(ValidationError::InvalidShape {
                field: "methods".to_string(),
                expected: "list of method strings",
                found: shape_of("methods"),
            })
        }
        Some(items) => {
            if let Some(bad) = items.iter().find(|item| !item.is_string()) {
                return Err(ValidationError::InvalidShape {
                    field: "methods".to_string(),
                    expected: "list of method strings",
                    found: format!("list containing {}", json_type_name(bad)),
                });
            }
        }
    }
    if !value["uri"].is_string() {
        return Err(ValidationError::InvalidShape {
            field: "uri".to_string(),
            expected: "string",
            found: shape_of("uri"),
        });
    }
    for field in [
        "metadata",
        "headers",
        "urlParameters",
        "queryParameters",
        "bodyParameters",
        "responseFields",
    ] {
        if let Some(present) = value.get(field) {
            if !present.is_object() {
                return Err(ValidationError::InvalidShape {
                    field: field.to_string(),
                    expected: "object",
                    found: shape_of(field),
                });
            }
        }
    }
    for field in ["responses", "auth"] {
        if let Some(present) = value.get(field) {
            if !present.is_array() {
                return Err(ValidationError::InvalidShape {
                    field: field.to_string(),
                    expected: "list",
                    found: shape_of(field),
                });
            }
        }
    }
    Ok(())
}

/// Assemble the raw description from untyped JSON, group entry by entry
///
/// Whole-struct deserialization reports nested failures without a field
/// name, so each parameter group, header, and response is taken apart here
/// and every failure names the entry that caused it.
fn raw_from_value(value: Value) -> Result<RawEndpoint, ValidationError> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(ValidationError::InvalidShape {
                field: "endpoint".to_string(),
                expected: "object",
                found: json_type_name(&other).to_string(),
            })
        }
    };

    // methods and uri were shape-checked up front
    let methods = match map.remove("methods") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    let uri = match map.remove("uri") {
        Some(Value::String(uri)) => uri,
        _ => String::new(),
    };

    let metadata = match map.remove("metadata") {
        None | Some(Value::Null) => Metadata::default(),
        Some(value) => {
            let found = json_type_name(&value).to_string();
            serde_json::from_value(value).map_err(|_| ValidationError::InvalidShape {
                field: "metadata".to_string(),
                expected: "metadata object",
                found,
            })?
        }
    };

    let mut headers = IndexMap::new();
    if let Some(Value::Object(entries)) = map.remove("headers") {
        for (name, value) in entries {
            match value {
                Value::String(header) => {
                    headers.insert(name, header);
                }
                other => {
                    return Err(ValidationError::InvalidShape {
                        field: format!("headers.{name}"),
                        expected: "string",
                        found: json_type_name(&other).to_string(),
                    })
                }
            }
        }
    }

    let url_parameters = parameter_group(&mut map, "urlParameters")?;
    let query_parameters = parameter_group(&mut map, "queryParameters")?;
    let body_parameters = parameter_group(&mut map, "bodyParameters")?;

    let mut responses = Vec::new();
    if let Some(Value::Array(items)) = map.remove("responses") {
        for (index, item) in items.into_iter().enumerate() {
            let found = json_type_name(&item).to_string();
            responses.push(serde_json::from_value(item).map_err(|_| {
                ValidationError::InvalidShape {
                    field: format!("responses[{index}]"),
                    expected: "response object with a numeric status",
                    found,
                }
            })?);
        }
    }

    let mut response_fields = IndexMap::new();
    if let Some(Value::Object(entries)) = map.remove("responseFields") {
        for (name, value) in entries {
            let found = json_type_name(&value).to_string();
            let field: RawResponseField =
                serde_json::from_value(value).map_err(|_| ValidationError::InvalidShape {
                    field: format!("responseFields.{name}"),
                    expected: "response field object",
                    found,
                })?;
            response_fields.insert(name, field);
        }
    }

    let auth = match map.remove("auth") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    Ok(RawEndpoint {
        methods,
        uri,
        metadata,
        headers,
        url_parameters,
        query_parameters,
        body_parameters,
        responses,
        response_fields,
        auth,
    })
}

fn parameter_group(
    map: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<IndexMap<String, RawParameter>, ValidationError> {
    let mut out = IndexMap::new();
    if let Some(Value::Object(entries)) = map.remove(key) {
        for (name, value) in entries {
            let found = json_type_name(&value).to_string();
            let parameter: RawParameter =
                serde_json::from_value(value).map_err(|_| ValidationError::InvalidShape {
                    field: format!("{key}.{name}"),
                    expected: "parameter object",
                    found,
                })?;
            out.insert(name, parameter);
        }
    }
    Ok(out)
}

impl EndpointRecord {
    /// Normalize a raw extracted-endpoint description into the canonical
    /// record
    ///
    /// Pure and synchronous; all derived fields are computed here and the
    /// record is read-only afterwards. Fails atomically with a
    /// [`ValidationError`] naming the offending field.
    pub fn from_raw(raw: RawEndpoint) -> Result<Self, ValidationError> {
        let methods = dedup_methods(&raw.methods)?;

        let url_parameters = materialize_group(&raw.url_parameters)?;
        let query_parameters = materialize_group(&raw.query_parameters)?;
        let body_parameters = materialize_group(&raw.body_parameters)?;
        let response_fields = materialize_response_fields(&raw.response_fields)?;

        let clean_url_parameters = clean_parameters(&url_parameters);
        let clean_query_parameters = clean_parameters(&query_parameters);
        let clean_body = clean_parameters(&body_parameters);

        let bound_uri = bind_uri(&raw.uri, &clean_url_parameters);

        let (clean_body_parameters, file_parameters) = partition_file_parameters(clean_body);
        let mut headers = raw.headers;
        if !file_parameters.is_empty() {
            headers.insert("Content-Type".to_string(), MULTIPART_CONTENT_TYPE.to_string());
        }

        let nested_body_parameters = nest_parameters(&clean_body_parameters)?;
        let auth = parse_auth(&raw.auth)?;

        let record = EndpointRecord {
            methods,
            uri: raw.uri,
            bound_uri,
            metadata: raw.metadata,
            headers,
            url_parameters,
            clean_url_parameters,
            query_parameters,
            clean_query_parameters,
            body_parameters,
            clean_body_parameters,
            file_parameters,
            nested_body_parameters,
            responses: raw.responses,
            response_fields,
            auth,
        };
        debug!(
            endpoint = %record.endpoint_id(),
            files = record.file_parameters.len(),
            "normalized endpoint"
        );
        Ok(record)
    }

    /// Normalize an untyped JSON description
    ///
    /// Convenience entry point for callers holding the raw extraction output
    /// as a [`serde_json::Value`].
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        if !value.is_object() {
            return Err(ValidationError::InvalidShape {
                field: "endpoint".to_string(),
                expected: "object",
                found: json_type_name(&value).to_string(),
            });
        }
        validate_top_level_shape(&value)?;
        Self::from_raw(raw_from_value(value)?)
    }

    /// Stable identifier for this endpoint, safe for anchors and file names
    ///
    /// First method plus the URI with `/ ? { } :` replaced by `-`.
    pub fn endpoint_id(&self) -> String {
        let method = self.methods.first().map(Method::as_str).unwrap_or("");
        let uri = self.uri.replace(['/', '?', '{', '}', ':'], "-");
        format!("{method}{uri}")
    }

    /// Human-readable label, e.g. `[GET] /users/{id}`
    pub fn name(&self) -> String {
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        format!("[{}] {}", methods.join(","), self.uri)
    }

    pub fn is_get(&self) -> bool {
        self.methods.contains(&Method::GET)
    }

    pub fn has_responses(&self) -> bool {
        !self.responses.is_empty()
    }

    pub fn has_files(&self) -> bool {
        !self.file_parameters.is_empty()
    }

    /// Whether rendering a request for this endpoint needs any options at
    /// all: headers, query values, or body values
    pub fn has_request_options(&self) -> bool {
        !self.headers.is_empty()
            || !self.clean_query_parameters.is_empty()
            || !self.clean_body_parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_method_kept_as_is() {
        let methods = dedup_methods(&["HEAD".to_string()]).unwrap();
        assert_eq!(methods, vec![Method::HEAD]);
    }

    #[test]
    fn test_head_stripped_next_to_get() {
        let methods =
            dedup_methods(&["GET".to_string(), "HEAD".to_string(), "POST".to_string()]).unwrap();
        assert_eq!(methods, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_lowercase_methods_accepted() {
        let methods = dedup_methods(&["get".to_string(), "head".to_string()]).unwrap();
        assert_eq!(methods, vec![Method::GET]);
    }

    #[test]
    fn test_invalid_method_rejected() {
        let err = dedup_methods(&["FETCH ALL".to_string()]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidMethod {
                value: "FETCH ALL".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_method_list_rejected() {
        let err = dedup_methods(&[]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidShape { ref field, .. } if field == "methods"));
    }

    #[test]
    fn test_bind_uri_substitutes_examples() {
        let mut clean = IndexMap::new();
        clean.insert("id".to_string(), ExampleValue::Scalar(json!(42)));
        assert_eq!(bind_uri("/users/{id}", &clean), "/users/42");
        assert_eq!(bind_uri("/users/{id?}", &clean), "/users/42");
    }

    #[test]
    fn test_bind_uri_leaves_unknown_placeholders() {
        let clean = IndexMap::new();
        assert_eq!(bind_uri("/users/{id}/posts", &clean), "/users/{id}/posts");
    }

    #[test]
    fn test_clean_projection_drops_exampleless_parameters() {
        let raw: IndexMap<String, RawParameter> = serde_json::from_value(json!({
            "id": { "type": "integer", "example": 7, "required": true },
            "filter": { "type": "string", "description": "no example here" }
        }))
        .unwrap();
        let group = materialize_group(&raw).unwrap();
        let clean = clean_parameters(&group);
        assert_eq!(clean.len(), 1);
        assert_eq!(clean["id"], ExampleValue::Scalar(json!(7)));
    }

    #[test]
    fn test_file_example_materializes_from_declared_type() {
        let raw: IndexMap<String, RawParameter> = serde_json::from_value(json!({
            "photo": { "type": "file", "example": "cat.jpg" },
            "scans": { "type": "file[]", "example": ["a.pdf", "b.pdf"] }
        }))
        .unwrap();
        let group = materialize_group(&raw).unwrap();
        assert!(group["photo"].example.as_ref().unwrap().is_file_like());
        assert!(group["scans"].example.as_ref().unwrap().is_file_like());
    }

    #[test]
    fn test_array_example_must_be_an_array() {
        let raw: IndexMap<String, RawParameter> = serde_json::from_value(json!({
            "tags": { "type": "string[]", "example": "oops" }
        }))
        .unwrap();
        let err = materialize_group(&raw).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidShape {
                field: "tags".to_string(),
                expected: "array example",
                found: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_auth_triple_parses() {
        let auth = parse_auth(&[json!("query"), json!("api_key"), json!("njiuyiw97865")])
            .unwrap()
            .unwrap();
        assert_eq!(auth.location, "query");
        assert_eq!(auth.name, "api_key");
        assert_eq!(auth.example, json!("njiuyiw97865"));
    }

    #[test]
    fn test_auth_empty_means_none() {
        assert_eq!(parse_auth(&[]).unwrap(), None);
    }

    #[test]
    fn test_auth_wrong_arity_rejected() {
        let err = parse_auth(&[json!("query")]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidShape { ref field, .. } if field == "auth"));
    }

    #[test]
    fn test_from_value_names_missing_field() {
        let err = EndpointRecord::from_value(json!({ "uri": "/users" })).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "methods".to_string(),
            }
        );
    }

    #[test]
    fn test_from_value_names_wrongly_shaped_field() {
        let err = EndpointRecord::from_value(json!({
            "methods": "GET",
            "uri": "/users"
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidShape {
                field: "methods".to_string(),
                expected: "list of method strings",
                found: "string".to_string(),
            }
        );

        let err = EndpointRecord::from_value(json!({
            "methods": ["GET"],
            "uri": "/users",
            "bodyParameters": []
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidShape { ref field, .. } if field == "bodyParameters"));
    }

    #[test]
    fn test_nested_malformed_parameter_names_the_entry() {
        let err = EndpointRecord::from_value(json!({
            "methods": ["POST"],
            "uri": "/users",
            "bodyParameters": { "avatar": 5 }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidShape {
                field: "bodyParameters.avatar".to_string(),
                expected: "parameter object",
                found: "number".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_response_entry_names_the_index() {
        let err = EndpointRecord::from_value(json!({
            "methods": ["GET"],
            "uri": "/users",
            "responses": [
                { "status": 200 },
                { "status": "OK" }
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidShape { ref field, .. } if field == "responses[1]"));
    }

    #[test]
    fn test_malformed_header_names_the_entry() {
        let err = EndpointRecord::from_value(json!({
            "methods": ["GET"],
            "uri": "/users",
            "headers": { "X-Rate-Limit": 60 }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidShape {
                field: "headers.X-Rate-Limit".to_string(),
                expected: "string",
                found: "number".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_response_field_names_the_entry() {
        let err = EndpointRecord::from_value(json!({
            "methods": ["GET"],
            "uri": "/users",
            "responseFields": { "id": "integer" }
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidShape { ref field, .. } if field == "responseFields.id"));
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = EndpointRecord::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidShape { ref field, .. } if field == "endpoint"));
    }

    #[test]
    fn test_endpoint_id_has_no_reserved_characters() {
        let record = EndpointRecord::from_value(json!({
            "methods": ["GET"],
            "uri": "/users/{id}/posts?draft:latest"
        }))
        .unwrap();
        let id = record.endpoint_id();
        assert_eq!(id, "GET-users--id--posts-draft-latest");
        assert!(!id.contains(['/', '?', '{', '}', ':']));
    }

    #[test]
    fn test_name_label() {
        let record = EndpointRecord::from_value(json!({
            "methods": ["PUT", "PATCH"],
            "uri": "/users/{id}"
        }))
        .unwrap();
        assert_eq!(record.name(), "[PUT,PATCH] /users/{id}");
    }

    #[test]
    fn test_request_options_presence() {
        let bare = EndpointRecord::from_value(json!({
            "methods": ["GET"],
            "uri": "/ping"
        }))
        .unwrap();
        assert!(!bare.has_request_options());

        let with_query = EndpointRecord::from_value(json!({
            "methods": ["GET"],
            "uri": "/users",
            "queryParameters": { "page": { "type": "integer", "example": 1 } }
        }))
        .unwrap();
        assert!(with_query.has_request_options());
    }
}
