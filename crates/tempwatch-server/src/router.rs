//! Request routing and path matching.
//!
//! The router maps method and path to a route name. The route name is what
//! the request log records and what the dispatcher uses to pick a handler.
//! Matching is by path segment, so `/api/v1` and `/api/v1/` are the same
//! route.
//!
//! # Example
//!
//! ```rust
//! use tempwatch_server::router::{Router, ERRORS_GET, TEMP_POST};
//! use http::Method;
//!
//! let router = Router::standard("/api/v1");
//!
//! let m = router.match_route(&Method::GET, "/api/v1/errors").unwrap();
//! assert_eq!(m.route_name(), ERRORS_GET);
//!
//! assert!(router.match_route(&Method::GET, "/api/v1/temp").is_none());
//! assert!(router.has_route(TEMP_POST));
//! ```

use std::collections::HashMap;

use http::Method;

/// Landing page redirect.
pub const INDEX: &str = "Index";

/// Clears the error store.
pub const ERRORS_DELETE: &str = "ErrorsDelete";

/// Lists the error store.
pub const ERRORS_GET: &str = "ErrorsGet";

/// Accepts a temperature reading.
pub const TEMP_POST: &str = "TempPost";

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    route_name: String,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(route_name: impl Into<String>, params: HashMap<String, String>) -> Self {
        Self {
            route_name: route_name.into(),
            params,
        }
    }

    /// Returns the name of the matched route.
    #[must_use]
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    name: String,
}

impl Route {
    fn new(method: Method, pattern: &str, name: impl Into<String>) -> Self {
        Self {
            method,
            segments: Self::parse_segments(pattern),
            name: name.into(),
        }
    }

    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) if expected != actual => return None,
                PathSegment::Literal(_) => {}
                PathSegment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }

        Some(params)
    }
}

/// HTTP request router.
///
/// Routes are checked in registration order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Creates the service route table under `prefix`.
    #[must_use]
    pub fn standard(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let mut router = Self::new();
        router.add_route(Method::GET, format!("{prefix}/"), INDEX);
        router.add_route(Method::DELETE, format!("{prefix}/errors"), ERRORS_DELETE);
        router.add_route(Method::GET, format!("{prefix}/errors"), ERRORS_GET);
        router.add_route(Method::POST, format!("{prefix}/temp"), TEMP_POST);
        router
    }

    /// Adds a route.
    pub fn add_route(&mut self, method: Method, pattern: impl AsRef<str>, name: impl Into<String>) {
        self.routes.push(Route::new(method, pattern.as_ref(), name));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches a request to a route.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route
                    .match_path(path)
                    .map(|params| RouteMatch::new(&route.name, params))
            })
    }

    /// Checks if a route with the given name is registered.
    #[must_use]
    pub fn has_route(&self, name: &str) -> bool {
        self.routes.iter().any(|r| r.name == name)
    }

    /// Returns the registered route names in order.
    #[must_use]
    pub fn route_names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.name.as_str()).collect()
    }
}
