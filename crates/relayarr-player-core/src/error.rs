//! Error types for media host calls.

use thiserror::Error;

/// Primary error type for remote media host operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host could not be reached at all.
    #[error("media host unreachable")]
    Unreachable {
        /// Operation identifier.
        operation: &'static str,
        /// Transport failure detail.
        detail: String,
    },
    /// The call exceeded its timeout.
    #[error("media host call timed out")]
    Timeout {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The host rejected the configured credentials.
    #[error("media host rejected credentials")]
    Unauthorized {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The host answered with a non-success HTTP status.
    #[error("media host returned an http error")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
    },
    /// The host answered with an RPC error object.
    #[error("media host rejected the call")]
    Rpc {
        /// Operation identifier.
        operation: &'static str,
        /// RPC error code.
        code: i64,
        /// RPC error message.
        message: String,
    },
    /// The host answered with a payload that could not be interpreted.
    #[error("media host returned an invalid response")]
    InvalidResponse {
        /// Operation identifier.
        operation: &'static str,
        /// What was wrong with the payload.
        detail: String,
    },
}

impl HostError {
    /// Operation identifier carried by every variant.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Unreachable { operation, .. }
            | Self::Timeout { operation }
            | Self::Unauthorized { operation }
            | Self::Http { operation, .. }
            | Self::Rpc { operation, .. }
            | Self::InvalidResponse { operation, .. } => operation,
        }
    }

    /// Whether the failure was a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Convenience alias for media host results.
pub type HostResult<T> = Result<T, HostError>;
