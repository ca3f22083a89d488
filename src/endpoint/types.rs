use super::nest::NestedValue;
use crate::error::ValidationError;
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Semantic type of a documented parameter
///
/// Decided once while materializing the raw description; everything
/// downstream (file partitioning, nesting) is a plain match over this tag
/// instead of runtime shape inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    File,
    Array {
        /// Element type when the raw type was written as `T[]`; `None` for
        /// a bare `array`
        element: Option<Box<ParameterKind>>,
    },
}

impl ParameterKind {
    /// Parse a raw type string (`string`, `integer`, `file`, `string[]`, ...)
    ///
    /// `field` is the parameter name, used in the error when the type string
    /// is not recognized.
    pub fn parse(raw: &str, field: &str) -> Result<Self, ValidationError> {
        if let Some(inner) = raw.strip_suffix("[]") {
            return Ok(ParameterKind::Array {
                element: Some(Box::new(Self::parse(inner, field)?)),
            });
        }
        match raw {
            "string" => Ok(ParameterKind::String),
            "integer" | "int" => Ok(ParameterKind::Integer),
            "number" => Ok(ParameterKind::Number),
            "boolean" | "bool" => Ok(ParameterKind::Boolean),
            "object" => Ok(ParameterKind::Object),
            "file" => Ok(ParameterKind::File),
            "array" => Ok(ParameterKind::Array { element: None }),
            other => Err(ValidationError::UnknownType {
                field: field.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterKind::String => write!(f, "string"),
            ParameterKind::Integer => write!(f, "integer"),
            ParameterKind::Number => write!(f, "number"),
            ParameterKind::Boolean => write!(f, "boolean"),
            ParameterKind::Object => write!(f, "object"),
            ParameterKind::File => write!(f, "file"),
            ParameterKind::Array { element: None } => write!(f, "array"),
            ParameterKind::Array {
                element: Some(inner),
            } => write!(f, "{}[]", inner),
        }
    }
}

impl Serialize for ParameterKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Reference to an example upload file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl FileRef {
    /// Build a file reference from a raw example value
    ///
    /// Accepts a bare filename string or an object with `filename` (or
    /// `name`) and an optional `contentType`.
    pub fn from_value(field: &str, value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::String(filename) => Ok(FileRef {
                filename: filename.clone(),
                content_type: None,
            }),
            Value::Object(map) => {
                let filename = map
                    .get("filename")
                    .or_else(|| map.get("name"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| ValidationError::InvalidShape {
                        field: field.to_string(),
                        expected: "file object with a 'filename' string",
                        found: json_type_name(value).to_string(),
                    })?;
                let content_type = map
                    .get("contentType")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(FileRef {
                    filename: filename.to_string(),
                    content_type,
                })
            }
            other => Err(ValidationError::InvalidShape {
                field: field.to_string(),
                expected: "filename string or file object",
                found: json_type_name(other).to_string(),
            }),
        }
    }
}

/// A parameter example value, tagged by shape
///
/// Serializes transparently: scalars as themselves, lists as sequences,
/// files as their `FileRef` object. The renderer sees plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ExampleValue {
    Scalar(Value),
    List(Vec<ExampleValue>),
    File(FileRef),
}

impl ExampleValue {
    /// Whether this value belongs in the file-parameters group: an upload
    /// file, or a list whose first element is one
    pub fn is_file_like(&self) -> bool {
        match self {
            ExampleValue::File(_) => true,
            ExampleValue::List(items) => matches!(items.first(), Some(ExampleValue::File(_))),
            ExampleValue::Scalar(_) => false,
        }
    }
}

impl Serialize for ExampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExampleValue::Scalar(value) => value.serialize(serializer),
            ExampleValue::List(items) => items.serialize(serializer),
            ExampleValue::File(file) => file.serialize(serializer),
        }
    }
}

/// A fully materialized endpoint parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<ExampleValue>,
    pub required: bool,
}

/// One documented response for an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub status: u16,
    /// Raw example payload as captured by the extraction pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Documents a single field inside a response payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFieldDescription {
    /// Field path inside the payload (`data.id`, `items[].name`)
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Grouping and display metadata attached by the extraction pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub authenticated: bool,
}

/// Authentication info for an endpoint: where the credential goes, the
/// field name, and an example value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthInfo {
    pub location: String,
    pub name: String,
    pub example: Value,
}

/// Raw parameter entry as produced by the extraction pipeline
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParameter {
    /// Type string; defaults to `string` when absent
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub example: Option<Value>,
    #[serde(default)]
    pub required: bool,
}

/// Raw response-field entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponseField {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The unnormalized endpoint description handed over by route extraction
///
/// Parameter maps preserve extraction order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEndpoint {
    pub methods: Vec<String>,
    pub uri: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub url_parameters: IndexMap<String, RawParameter>,
    #[serde(default)]
    pub query_parameters: IndexMap<String, RawParameter>,
    #[serde(default)]
    pub body_parameters: IndexMap<String, RawParameter>,
    #[serde(default)]
    pub responses: Vec<ResponseEntry>,
    #[serde(default)]
    pub response_fields: IndexMap<String, RawResponseField>,
    /// `[location, name, exampleValue]` triple; empty when the endpoint is
    /// unauthenticated
    #[serde(default)]
    pub auth: Vec<Value>,
}

/// The canonical endpoint record consumed by the documentation renderer
///
/// Constructed once via [`EndpointRecord::from_raw`]; read-only afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    #[serde(serialize_with = "serialize_methods")]
    pub methods: Vec<Method>,
    /// URI template as extracted (`/users/{id}`)
    pub uri: String,
    /// URI with example values bound into its placeholders (`/users/42`)
    pub bound_uri: String,
    pub metadata: Metadata,
    pub headers: IndexMap<String, String>,
    pub url_parameters: IndexMap<String, Parameter>,
    pub clean_url_parameters: IndexMap<String, ExampleValue>,
    pub query_parameters: IndexMap<String, Parameter>,
    pub clean_query_parameters: IndexMap<String, ExampleValue>,
    pub body_parameters: IndexMap<String, Parameter>,
    /// Example values of the non-file body parameters
    pub clean_body_parameters: IndexMap<String, ExampleValue>,
    /// Example values of the upload-file body parameters
    pub file_parameters: IndexMap<String, ExampleValue>,
    /// Body parameters regrouped by dotted/array-indexed field names
    pub nested_body_parameters: IndexMap<String, NestedValue>,
    pub responses: Vec<ResponseEntry>,
    pub response_fields: IndexMap<String, ResponseFieldDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthInfo>,
}

fn serialize_methods<S: Serializer>(methods: &[Method], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(methods.iter().map(Method::as_str))
}

/// JSON type name for error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
