//! Error types for building Kodi clients.

use thiserror::Error;

/// Failures while constructing a [`crate::KodiClient`]; call failures use `HostError`.
#[derive(Debug, Error)]
pub enum KodiError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid kodi endpoint")]
    InvalidEndpoint {
        /// Offending endpoint.
        value: String,
        /// Parse failure.
        source: url::ParseError,
    },
    /// The HTTP client could not be built.
    #[error("failed to build http client")]
    BuildClient {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
}

/// Convenience alias for client construction results.
pub type KodiResult<T> = Result<T, KodiError>;
