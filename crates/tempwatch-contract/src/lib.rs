//! Tempwatch Contract - request checking against a declarative API contract.
//!
//! The contract lists every operation the service exposes (method, path
//! template, parameters, request body schema). Incoming requests are first
//! resolved to an operation and then validated against it.
//!
//! # Architecture
//!
//! ```text
//!   contract JSON ──► ContractLoader ──► LoadedContract
//!                                          │
//!       HTTP request ──► find_route ───────┤ OperationResolver
//!                          │               │ (method + path → operation id)
//!                          ▼               │
//!                       validate ──────────┘ RequestValidator
//!                                            (params + body schema)
//! ```
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use tempwatch_contract::{ContractLoader, ContractValidator, RequestInput};
//!
//! let contract = ContractLoader::builtin().unwrap();
//!
//! let route = contract.find_route(&Method::POST, "/api/v1/temp").unwrap();
//! assert_eq!(route.operation_id, "TempPost");
//!
//! let body = br#"{"data":"1:2:'Temperature':3.0"}"#;
//! let input = RequestInput::new(&Method::POST, "/api/v1/temp").with_body(body);
//! assert!(contract.validate(&route, &input).is_ok());
//! ```

#![doc(html_root_url = "https://docs.rs/tempwatch-contract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod document;
mod error;
mod loader;
pub mod resolver;
pub mod validation;
mod validator;

pub use document::{
    ContractDocument, OperationSpec, ParamLocation, ParamType, ParameterSpec, RequestBodySpec,
    SchemaSpec, SchemaType,
};
pub use error::{ContractError, ContractResult, Violation};
pub use loader::{ContractLoader, BUILTIN_CONTRACT};
pub use resolver::OperationResolver;
pub use validation::{RequestInput, RequestValidator};
pub use validator::{ContractValidator, LoadedContract, RouteResolution};
