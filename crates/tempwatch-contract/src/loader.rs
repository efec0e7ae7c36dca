//! Contract loading.

use std::collections::HashSet;
use std::path::Path;

use http::Method;
use tokio::fs;
use tracing::info;

use crate::document::{ContractDocument, ParamLocation};
use crate::error::{ContractError, ContractResult};
use crate::validator::LoadedContract;

/// The contract shipped with the service.
pub const BUILTIN_CONTRACT: &str = include_str!("../contract/tempwatch.json");

/// Loads contracts from files or strings.
pub struct ContractLoader;

impl ContractLoader {
    /// Load a contract from a JSON file.
    pub async fn from_file(path: impl AsRef<Path>) -> ContractResult<LoadedContract> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading contract from file");

        let content = fs::read_to_string(path).await.map_err(|e| {
            ContractError::Load(format!("failed to read {}: {e}", path.display()))
        })?;

        Self::from_json(&content)
    }

    /// Load a contract from a JSON string.
    pub fn from_json(json: &str) -> ContractResult<LoadedContract> {
        let document: ContractDocument =
            serde_json::from_str(json).map_err(|e| ContractError::parse(e.to_string()))?;
        Self::check(&document)?;

        info!(
            service = %document.service,
            version = %document.version,
            operations = document.operations.len(),
            "contract loaded"
        );

        LoadedContract::new(document)
    }

    /// Load the contract embedded in the binary.
    pub fn builtin() -> ContractResult<LoadedContract> {
        Self::from_json(BUILTIN_CONTRACT)
    }

    fn check(document: &ContractDocument) -> ContractResult<()> {
        if document.operations.is_empty() {
            return Err(ContractError::parse("contract declares no operations"));
        }

        let base = &document.base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(ContractError::parse(format!(
                "base_path '{base}' must start with '/' and must not end with '/'"
            )));
        }

        let mut ids = HashSet::new();
        let mut routes = HashSet::new();

        for op in &document.operations {
            if !ids.insert(op.id.as_str()) {
                return Err(ContractError::parse(format!("duplicate operation id '{}'", op.id)));
            }

            let method = Method::from_bytes(op.method.to_uppercase().as_bytes()).map_err(|_| {
                ContractError::parse(format!("operation '{}' has invalid method '{}'", op.id, op.method))
            })?;

            if !op.path.starts_with('/') {
                return Err(ContractError::parse(format!(
                    "operation '{}' path '{}' must start with '/'",
                    op.id, op.path
                )));
            }

            if !routes.insert((method, op.path.trim_end_matches('/').to_string())) {
                return Err(ContractError::parse(format!(
                    "operation '{}' duplicates {} {}",
                    op.id, op.method, op.path
                )));
            }

            for param in &op.parameters {
                if param.location == ParamLocation::Path
                    && !op.path.contains(&format!("{{{}}}", param.name))
                {
                    return Err(ContractError::parse(format!(
                        "operation '{}' declares path parameter '{}' missing from '{}'",
                        op.id, param.name, op.path
                    )));
                }
            }
        }

        Ok(())
    }
}
