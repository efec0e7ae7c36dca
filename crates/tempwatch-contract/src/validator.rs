//! The contract validation capability and its default implementation.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::document::ContractDocument;
use crate::error::{ContractError, ContractResult};
use crate::resolver::OperationResolver;
use crate::validation::{RequestInput, RequestValidator};

/// Result of resolving a request to a declared operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResolution {
    /// Id of the matched operation.
    pub operation_id: String,
    /// Path template that matched.
    pub path_template: String,
    /// Extracted path parameters.
    pub path_params: HashMap<String, String>,
}

/// Capability to match requests to contract operations and check them.
///
/// Implementations are read-only after construction and shared across
/// request tasks.
pub trait ContractValidator: Send + Sync {
    /// Resolves a request to a declared operation.
    fn find_route(&self, method: &Method, path: &str) -> ContractResult<RouteResolution>;

    /// Checks a request against the operation it resolved to.
    fn validate(&self, route: &RouteResolution, request: &RequestInput<'_>) -> ContractResult<()>;
}

/// A contract ready to check traffic.
#[derive(Debug, Clone)]
pub struct LoadedContract {
    document: Arc<ContractDocument>,
    resolver: Arc<OperationResolver>,
    validator: RequestValidator,
}

impl LoadedContract {
    /// Compiles a document.
    pub fn new(document: ContractDocument) -> ContractResult<Self> {
        let resolver = OperationResolver::from_document(&document)?;
        Ok(Self {
            document: Arc::new(document),
            resolver: Arc::new(resolver),
            validator: RequestValidator::new(),
        })
    }

    /// Returns the underlying document.
    pub fn document(&self) -> &ContractDocument {
        &self.document
    }

    /// Returns the service name.
    pub fn service(&self) -> &str {
        &self.document.service
    }

    /// Returns the contract version.
    pub fn version(&self) -> &str {
        &self.document.version
    }

    /// Returns the number of declared operations.
    pub fn operation_count(&self) -> usize {
        self.document.operations.len()
    }
}

impl ContractValidator for LoadedContract {
    fn find_route(&self, method: &Method, path: &str) -> ContractResult<RouteResolution> {
        self.resolver.resolve(method.as_str(), path)
    }

    fn validate(&self, route: &RouteResolution, request: &RequestInput<'_>) -> ContractResult<()> {
        let operation = self
            .document
            .operation(&route.operation_id)
            .ok_or_else(|| ContractError::RouteNotFound {
                method: request.method.to_string(),
                path: request.path.to_string(),
            })?;

        let errors = self.validator.validate(operation, route, request);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ContractError::Validation {
                operation_id: operation.id.clone(),
                errors,
            })
        }
    }
}
