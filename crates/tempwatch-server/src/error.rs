//! Server error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a valid socket address.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Why it could not be parsed.
        reason: String,
    },

    /// Failed to bind to the configured address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The index redirect target is not a valid header value.
    #[error("invalid index location '{0}'")]
    InvalidIndexLocation(String),

    /// The server was built without a contract.
    #[error("no contract configured")]
    MissingContract,

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Creates an invalid address error.
    pub fn invalid_address(addr: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidAddress {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::invalid_address("nope", "invalid socket address syntax");
        assert_eq!(
            err.to_string(),
            "invalid address 'nope': invalid socket address syntax"
        );

        let err = ServerError::Bind {
            addr: "127.0.0.1:80".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("failed to bind to 127.0.0.1:80"));
        assert_eq!(ServerError::MissingContract.to_string(), "no contract configured");
    }
}
