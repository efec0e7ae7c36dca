//! Standard middleware stages.
//!
//! Stages execute in a fixed order:
//!
//! 1. [`logging`] - Log method, URI, route name and peer address
//! 2. [`validation`] - Resolve and check the request against the contract

pub mod logging;
pub mod validation;

pub use logging::RequestLoggingMiddleware;
pub use validation::ContractValidationMiddleware;
