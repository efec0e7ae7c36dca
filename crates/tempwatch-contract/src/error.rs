//! Contract error types.

use std::fmt;

use thiserror::Error;

/// Result type for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;

/// Errors raised while loading a contract or checking a request against it.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The contract document could not be read.
    #[error("failed to load contract: {0}")]
    Load(String),

    /// The contract document is malformed or inconsistent.
    #[error("failed to parse contract: {0}")]
    Parse(String),

    /// No operation matches the request path.
    #[error("no matching operation was found for {method} {path}")]
    RouteNotFound {
        /// HTTP method of the request.
        method: String,
        /// Request path.
        path: String,
    },

    /// The path exists but not for this method.
    #[error("method {method} is not allowed for {path}")]
    MethodNotAllowed {
        /// HTTP method of the request.
        method: String,
        /// Request path.
        path: String,
    },

    /// The request does not conform to the operation.
    #[error("request for '{operation_id}' violates the contract: {}", join(.errors))]
    Validation {
        /// Operation the request resolved to.
        operation_id: String,
        /// Every violation found.
        errors: Vec<Violation>,
    },
}

impl ContractError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns `true` when the request did not resolve to any operation.
    pub fn is_route_error(&self) -> bool {
        matches!(self, Self::RouteNotFound { .. } | Self::MethodNotAllowed { .. })
    }
}

/// A single contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Where the violation is (`path.id`, `query.limit`, `body.data`).
    pub location: String,
    /// What is wrong.
    pub message: String,
}

impl Violation {
    /// Create a violation.
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

fn join(errors: &[Violation]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_display() {
        let err = ContractError::RouteNotFound {
            method: "GET".to_string(),
            path: "/nope".to_string(),
        };
        assert_eq!(err.to_string(), "no matching operation was found for GET /nope");
        assert!(err.is_route_error());
    }

    #[test]
    fn test_validation_display_lists_violations() {
        let err = ContractError::Validation {
            operation_id: "TempPost".to_string(),
            errors: vec![
                Violation::new("body.data", "expected string"),
                Violation::new("query.limit", "expected integer, got 'x'"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "request for 'TempPost' violates the contract: body.data: expected string; query.limit: expected integer, got 'x'"
        );
        assert!(!err.is_route_error());
    }
}
