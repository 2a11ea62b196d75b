//! Error types for event ingress.

use thiserror::Error;

/// Failures while normalising the media manager's environment into an event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngressError {
    /// No event type variable was present.
    #[error("event type missing from environment")]
    MissingEventType,
    /// The event type was not recognised.
    #[error("unknown event type")]
    UnknownEventType {
        /// Raw event type value.
        value: String,
    },
    /// A variable required by the event type was absent.
    #[error("required environment variable missing")]
    MissingVariable {
        /// Variable name.
        name: &'static str,
    },
    /// A boolean variable did not read `true` or `false`.
    #[error("invalid boolean environment variable")]
    InvalidBoolean {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
    /// A numeric variable did not parse.
    #[error("invalid numeric environment variable")]
    InvalidNumber {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Convenience alias for ingress results.
pub type IngressResult<T> = Result<T, IngressError>;
