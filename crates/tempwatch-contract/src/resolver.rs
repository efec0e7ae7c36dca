//! Operation resolution from HTTP requests.
//!
//! The [`OperationResolver`] maps an incoming method and path to the id of a
//! declared operation, extracting path parameters on the way.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::document::{ContractDocument, OperationSpec};
use crate::error::{ContractError, ContractResult};
use crate::validator::RouteResolution;

/// Resolves requests to contract operations.
#[derive(Debug)]
pub struct OperationResolver {
    /// Routes indexed by uppercase HTTP method.
    routes: HashMap<String, Vec<CompiledRoute>>,
}

/// A compiled route for matching.
#[derive(Debug)]
struct CompiledRoute {
    template: String,
    pattern: Regex,
    param_names: Vec<String>,
    operation_id: String,
    literal_segments: usize,
}

impl OperationResolver {
    /// Builds a resolver for every operation of a document.
    pub fn from_document(document: &ContractDocument) -> ContractResult<Self> {
        let mut routes: HashMap<String, Vec<CompiledRoute>> = HashMap::new();

        for op in &document.operations {
            let compiled = Self::compile_route(&document.base_path, op)?;
            routes
                .entry(op.method.to_uppercase())
                .or_default()
                .push(compiled);
        }

        for method_routes in routes.values_mut() {
            method_routes.sort_by(Self::route_specificity);
        }

        debug!(
            methods = routes.len(),
            total_routes = routes.values().map(Vec::len).sum::<usize>(),
            "operation resolver initialized"
        );

        Ok(Self { routes })
    }

    /// Resolves a request to an operation.
    ///
    /// A path that exists under another method yields
    /// [`ContractError::MethodNotAllowed`].
    pub fn resolve(&self, method: &str, path: &str) -> ContractResult<RouteResolution> {
        let method_upper = method.to_uppercase();

        if let Some(resolution) = self
            .routes
            .get(&method_upper)
            .and_then(|routes| routes.iter().find_map(|route| route.matches(path)))
        {
            return Ok(resolution);
        }

        let other_method = self
            .routes
            .iter()
            .filter(|(m, _)| **m != method_upper)
            .any(|(_, routes)| routes.iter().any(|r| r.pattern.is_match(path)));

        if other_method {
            Err(ContractError::MethodNotAllowed {
                method: method.to_string(),
                path: path.to_string(),
            })
        } else {
            Err(ContractError::RouteNotFound {
                method: method.to_string(),
                path: path.to_string(),
            })
        }
    }

    /// Returns `true` if a route exists for the method and path.
    pub fn has_route(&self, method: &str, path: &str) -> bool {
        self.resolve(method, path).is_ok()
    }

    /// Returns the path templates registered for a method.
    pub fn routes_for_method(&self, method: &str) -> Vec<&str> {
        self.routes
            .get(&method.to_uppercase())
            .map(|routes| routes.iter().map(|r| r.template.as_str()).collect())
            .unwrap_or_default()
    }

    fn compile_route(base_path: &str, op: &OperationSpec) -> ContractResult<CompiledRoute> {
        let mut pattern = String::from("^");
        let mut param_names = Vec::new();
        let mut literal_segments = 0;
        let mut segment_count = 0;

        let segments = base_path
            .split('/')
            .chain(op.path.split('/'))
            .filter(|s| !s.is_empty());

        for segment in segments {
            segment_count += 1;
            pattern.push('/');

            if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                param_names.push(name.to_string());
                pattern.push_str("([^/]+)");
            } else {
                literal_segments += 1;
                pattern.push_str(&regex::escape(segment));
            }
        }

        if segment_count == 0 {
            pattern.push_str("/$");
        } else {
            pattern.push_str("/?$");
        }

        let pattern = Regex::new(&pattern).map_err(|e| {
            ContractError::parse(format!("invalid path template '{}': {e}", op.path))
        })?;

        Ok(CompiledRoute {
            template: op.path.clone(),
            pattern,
            param_names,
            operation_id: op.id.clone(),
            literal_segments,
        })
    }

    /// More literal segments first, then fewer parameters.
    fn route_specificity(a: &CompiledRoute, b: &CompiledRoute) -> Ordering {
        b.literal_segments
            .cmp(&a.literal_segments)
            .then_with(|| a.param_names.len().cmp(&b.param_names.len()))
    }
}

impl CompiledRoute {
    fn matches(&self, path: &str) -> Option<RouteResolution> {
        let captures = self.pattern.captures(path)?;
        let path_params = self
            .param_names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                captures
                    .get(i + 1)
                    .map(|value| (name.clone(), value.as_str().to_string()))
            })
            .collect();

        Some(RouteResolution {
            operation_id: self.operation_id.clone(),
            path_template: self.template.clone(),
            path_params,
        })
    }
}
