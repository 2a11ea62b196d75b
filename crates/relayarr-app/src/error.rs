//! # Design
//!
//! - Centralize bootstrap errors that stop the relay before an event is processed.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Event failures are not errors here; they are reported through `EventOutcome`.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for bootstrap operations.
pub type AppResult<T> = Result<T, AppError>;

/// Bootstrap error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Configuration file involved.
        path: PathBuf,
        /// Source configuration error.
        source: relayarr_config::ConfigError,
    },
    /// Logging could not be installed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: relayarr_telemetry::TelemetryError,
    },
    /// The process environment did not describe a valid event.
    #[error("event ingress failed")]
    Ingress {
        /// Operation identifier.
        operation: &'static str,
        /// Source ingress error.
        source: relayarr_events::IngressError,
    },
    /// A media host client could not be constructed.
    #[error("media host client construction failed")]
    HostClient {
        /// Configured host name.
        host: String,
        /// Source client error.
        source: relayarr_kodi::KodiError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        path: PathBuf,
        source: relayarr_config::ConfigError,
    ) -> Self {
        Self::Config {
            operation,
            path,
            source,
        }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: relayarr_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn ingress(
        operation: &'static str,
        source: relayarr_events::IngressError,
    ) -> Self {
        Self::Ingress { operation, source }
    }

    /// Process exit code for a failure that prevented processing.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. }
            | Self::Telemetry { .. }
            | Self::Ingress { .. }
            | Self::HostClient { .. } => 2,
        }
    }
}
