//! Request validation against operation declarations.
//!
//! Checks run in order: path parameters, query parameters, then the request
//! body (presence, media type, JSON syntax, schema). Every violation found
//! is reported, not just the first.

use std::collections::HashMap;

use http::Method;
use serde_json::Value;
use tracing::debug;

use crate::document::{
    OperationSpec, ParamLocation, ParameterSpec, RequestBodySpec, SchemaSpec, SchemaType,
};
use crate::error::Violation;
use crate::validator::RouteResolution;

/// The parts of a request the validator looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestInput<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// Request path.
    pub path: &'a str,
    /// Raw query string, without the `?`.
    pub query: Option<&'a str>,
    /// Value of the `Content-Type` header.
    pub content_type: Option<&'a str>,
    /// Raw request body.
    pub body: &'a [u8],
}

impl<'a> RequestInput<'a> {
    /// Creates an input with no query, no content type and an empty body.
    pub fn new(method: &'a Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            query: None,
            content_type: None,
            body: &[],
        }
    }

    /// Sets the query string.
    #[must_use]
    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query;
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: Option<&'a str>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: &'a [u8]) -> Self {
        self.body = body;
        self
    }

    fn query_pairs(&self) -> HashMap<&'a str, &'a str> {
        self.query
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .collect()
    }
}

/// Validates requests against a single operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestValidator;

impl RequestValidator {
    /// Creates a validator.
    pub fn new() -> Self {
        Self
    }

    /// Validates a request, returning every violation found.
    pub fn validate(
        &self,
        operation: &OperationSpec,
        route: &RouteResolution,
        input: &RequestInput<'_>,
    ) -> Vec<Violation> {
        let mut errors = Vec::new();
        let query = input.query_pairs();

        for param in &operation.parameters {
            match param.location {
                ParamLocation::Path => {
                    let value = route.path_params.get(&param.name).map(String::as_str);
                    Self::check_param(param, value, true, "path", &mut errors);
                }
                ParamLocation::Query => {
                    let value = query.get(param.name.as_str()).copied();
                    Self::check_param(param, value, param.required, "query", &mut errors);
                }
            }
        }

        if let Some(body_spec) = &operation.request_body {
            Self::check_body(body_spec, input, &mut errors);
        }

        if !errors.is_empty() {
            debug!(
                operation_id = %operation.id,
                violations = errors.len(),
                "request failed contract validation"
            );
        }

        errors
    }

    fn check_param(
        param: &ParameterSpec,
        value: Option<&str>,
        required: bool,
        location: &str,
        errors: &mut Vec<Violation>,
    ) {
        let key = format!("{location}.{}", param.name);
        match value {
            Some(value) if !param.param_type.accepts(value) => {
                errors.push(Violation::new(
                    key,
                    format!("expected {}, got '{value}'", param.param_type.as_str()),
                ));
            }
            Some(_) => {}
            None if required => {
                errors.push(Violation::new(
                    key,
                    format!("missing required {location} parameter '{}'", param.name),
                ));
            }
            None => {}
        }
    }

    fn check_body(spec: &RequestBodySpec, input: &RequestInput<'_>, errors: &mut Vec<Violation>) {
        if input.body.iter().all(u8::is_ascii_whitespace) {
            if spec.required {
                errors.push(Violation::new("body", "value is required but missing"));
            }
            return;
        }

        if let Some(content_type) = input.content_type {
            let media_type = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if media_type != spec.content_type.to_ascii_lowercase() {
                errors.push(Violation::new(
                    "body",
                    format!(
                        "unsupported content type '{media_type}', expected '{}'",
                        spec.content_type
                    ),
                ));
                return;
            }
        }

        if !is_json(&spec.content_type) {
            return;
        }

        match serde_json::from_slice::<Value>(input.body) {
            Ok(value) => validate_value(&spec.schema, &value, "body", errors),
            Err(e) => errors.push(Violation::new("body", format!("invalid JSON: {e}"))),
        }
    }
}

fn is_json(media_type: &str) -> bool {
    let media_type = media_type.to_ascii_lowercase();
    media_type == "application/json" || media_type.ends_with("+json")
}

/// Checks a JSON value against a schema, appending violations.
pub fn validate_value(
    schema: &SchemaSpec,
    value: &Value,
    location: &str,
    errors: &mut Vec<Violation>,
) {
    if value.is_null() {
        if !schema.nullable {
            errors.push(Violation::new(
                location,
                format!("expected {}, got null", schema.schema_type.as_str()),
            ));
        }
        return;
    }

    let type_ok = match schema.schema_type {
        SchemaType::Object => value.is_object(),
        SchemaType::Array => value.is_array(),
        SchemaType::String => value.is_string(),
        SchemaType::Number => value.is_number(),
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Integer => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
    };

    if !type_ok {
        errors.push(Violation::new(
            location,
            format!("expected {}, got {}", schema.schema_type.as_str(), json_type(value)),
        ));
        return;
    }

    if let Some(object) = value.as_object() {
        for field in &schema.required {
            if !object.contains_key(field) {
                errors.push(Violation::new(
                    format!("{location}.{field}"),
                    format!("missing required field '{field}'"),
                ));
            }
        }
        for (name, property) in &schema.properties {
            if let Some(child) = object.get(name) {
                validate_value(property, child, &format!("{location}.{name}"), errors);
            }
        }
    }

    if let (Some(items), Some(array)) = (&schema.items, value.as_array()) {
        for (i, child) in array.iter().enumerate() {
            validate_value(items, child, &format!("{location}[{i}]"), errors);
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
