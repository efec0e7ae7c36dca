//! Contract document model.
//!
//! A contract is a JSON document describing every operation of the service:
//!
//! ```json
//! {
//!   "service": "tempwatch",
//!   "version": "1.0.0",
//!   "base_path": "/api/v1",
//!   "operations": [
//!     { "id": "ErrorsGet", "method": "GET", "path": "/errors" }
//!   ]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A parsed contract document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractDocument {
    /// Service name.
    pub service: String,
    /// Contract version.
    pub version: String,
    /// Prefix shared by every operation path (e.g. `/api/v1`).
    #[serde(default)]
    pub base_path: String,
    /// Declared operations.
    pub operations: Vec<OperationSpec>,
}

impl ContractDocument {
    /// Finds an operation by id.
    pub fn operation(&self, id: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.id == id)
    }
}

/// A single operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationSpec {
    /// Operation id (also the route name).
    pub id: String,
    /// HTTP method.
    pub method: String,
    /// Path template relative to the base path (e.g. `/devices/{id}`).
    pub path: String,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Path and query parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterSpec>,
    /// Request body, if the operation accepts one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodySpec>,
}

/// A path or query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is carried.
    pub location: ParamLocation,
    /// Expected type.
    #[serde(rename = "type", default)]
    pub param_type: ParamType,
    /// Whether the parameter must be present. Path parameters always are.
    #[serde(default)]
    pub required: bool,
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// A `{name}` segment of the path template.
    Path,
    /// A query string pair.
    Query,
}

/// Parameter type for path/query validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Any string.
    #[default]
    String,
    /// A signed 64-bit integer.
    Integer,
    /// Any number.
    Number,
    /// `true` or `false`.
    Boolean,
}

impl ParamType {
    /// Returns the type name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Checks a raw parameter value.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::String => true,
            Self::Integer => value.parse::<i64>().is_ok(),
            Self::Number => value.parse::<f64>().is_ok(),
            Self::Boolean => value == "true" || value == "false",
        }
    }
}

/// Request body declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestBodySpec {
    /// Whether an empty body is rejected.
    #[serde(default)]
    pub required: bool,
    /// Accepted media type.
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Body schema.
    pub schema: SchemaSpec,
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// JSON schema subset used for request bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSpec {
    /// Value type.
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    /// Whether `null` is accepted.
    #[serde(default)]
    pub nullable: bool,
    /// Required object properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Object property schemas, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaSpec>,
    /// Array element schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaSpec>>,
}

impl SchemaSpec {
    /// Creates a schema of the given type with no constraints.
    pub fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            nullable: false,
            required: Vec::new(),
            properties: IndexMap::new(),
            items: None,
        }
    }
}

/// JSON value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// JSON object.
    Object,
    /// JSON array.
    Array,
    /// JSON string.
    String,
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    /// `true` or `false`.
    Boolean,
}

impl SchemaType {
    /// Returns the type name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}
