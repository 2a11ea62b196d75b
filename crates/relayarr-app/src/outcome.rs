//! Event failures and the per-event report.
//!
//! # Design
//! - `RelayError` is fatal for the event and carries the kind, host, path and last error.
//! - `SoftFailure` values are collected on the outcome instead of aborting the run.
//! - `EventOutcome` is the only thing the binary inspects to pick an exit code.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use relayarr_events::EventKind;
use relayarr_player_core::HostError;
use thiserror::Error;

/// Failure that stops processing of one event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// No enabled host answered the probe (or every playing host stayed busy).
    #[error("no media host available")]
    NoAvailableHost {
        /// Event being processed.
        event_kind: EventKind,
    },
    /// A blocking library operation did not finish in time.
    #[error("remote operation timed out")]
    RemoteOperationTimeout {
        /// Event being processed.
        event_kind: EventKind,
        /// Executor host.
        host: String,
        /// Operation identifier.
        operation: &'static str,
        /// Host-side path the operation targeted.
        path: Option<String>,
    },
    /// A primary library operation was rejected by the executor.
    #[error("remote operation failed")]
    RemoteOperation {
        /// Event being processed.
        event_kind: EventKind,
        /// Executor host.
        host: String,
        /// Host-side path the operation targeted.
        path: Option<String>,
        /// Last error returned by the host.
        source: HostError,
    },
    /// The whole event ran past its time budget.
    #[error("event exceeded its time budget")]
    EventBudgetExceeded {
        /// Event being processed.
        event_kind: EventKind,
        /// Configured budget.
        budget: Duration,
    },
}

/// Non-fatal problem recorded while processing an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftFailure {
    /// Host did not answer the probe.
    HostUnreachable {
        /// Host name.
        host: String,
    },
    /// Metadata of an affected item could not be read before the operation.
    MetadataCaptureFailed {
        /// Host name.
        host: String,
        /// Host-side path of the item.
        path: String,
    },
    /// Captured metadata could not be written back.
    MetadataReapplyFailed {
        /// Host name.
        host: String,
        /// Episode label.
        episode: String,
    },
    /// Companion files did not appear in time.
    NfoWaitTimeout {
        /// Source-side paths still missing.
        missing: Vec<String>,
    },
    /// Playback of an affected item could not be stopped.
    PlaybackStopFailed {
        /// Host name.
        host: String,
        /// Last error.
        detail: String,
    },
    /// Interrupted playback could not be restarted.
    PlaybackResumeFailed {
        /// Host name.
        host: String,
        /// Last error.
        detail: String,
    },
    /// GUI refresh failed on a secondary host.
    BroadcastFailed {
        /// Host name.
        host: String,
        /// Last error.
        detail: String,
    },
    /// Notification could not be delivered.
    NotifyFailed {
        /// Host name.
        host: String,
        /// Last error.
        detail: String,
    },
    /// Library clean failed or did not finish.
    CleanFailed {
        /// Host name.
        host: String,
        /// Last error.
        detail: String,
    },
    /// A targeted import found nothing new.
    NothingImported {
        /// Host-side directory that was scanned.
        directory: String,
    },
}

impl Display for SoftFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostUnreachable { host } => write!(formatter, "{host}: unreachable"),
            Self::MetadataCaptureFailed { host, path } => {
                write!(formatter, "{host}: metadata capture failed for {path}")
            }
            Self::MetadataReapplyFailed { host, episode } => {
                write!(formatter, "{host}: metadata reapply failed for {episode}")
            }
            Self::NfoWaitTimeout { missing } => {
                write!(formatter, "companion files missing: {}", missing.join(", "))
            }
            Self::PlaybackStopFailed { host, detail } => {
                write!(formatter, "{host}: playback stop failed: {detail}")
            }
            Self::PlaybackResumeFailed { host, detail } => {
                write!(formatter, "{host}: playback resume failed: {detail}")
            }
            Self::BroadcastFailed { host, detail } => {
                write!(formatter, "{host}: gui refresh failed: {detail}")
            }
            Self::NotifyFailed { host, detail } => {
                write!(formatter, "{host}: notification failed: {detail}")
            }
            Self::CleanFailed { host, detail } => {
                write!(formatter, "{host}: library clean failed: {detail}")
            }
            Self::NothingImported { directory } => {
                write!(formatter, "no new episodes found under {directory}")
            }
        }
    }
}

/// Final state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Everything ran.
    Success,
    /// The primary action ran (or was not needed) with soft failures.
    Partial,
    /// Processing stopped on a [`RelayError`].
    Failed,
}

impl OutcomeStatus {
    /// Lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// Report for one processed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    /// Event kind.
    pub kind: EventKind,
    /// Final state.
    pub status: OutcomeStatus,
    /// Host that executed the primary action.
    pub executor: Option<String>,
    /// Fatal failure when `status` is `Failed`.
    pub reason: Option<RelayError>,
    /// Soft failures in the order they happened.
    pub soft_failures: Vec<SoftFailure>,
}

impl EventOutcome {
    /// Outcome of a run that reached the end.
    #[must_use]
    pub fn completed(
        kind: EventKind,
        executor: Option<String>,
        soft_failures: Vec<SoftFailure>,
    ) -> Self {
        let status = if soft_failures.is_empty() {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Partial
        };
        Self {
            kind,
            status,
            executor,
            reason: None,
            soft_failures,
        }
    }

    /// Outcome of a run stopped by `reason`.
    #[must_use]
    pub const fn failed(
        kind: EventKind,
        executor: Option<String>,
        reason: RelayError,
        soft_failures: Vec<SoftFailure>,
    ) -> Self {
        Self {
            kind,
            status: OutcomeStatus::Failed,
            executor,
            reason: Some(reason),
            soft_failures,
        }
    }

    /// Process exit code: 1 for a failed event, 0 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.status {
            OutcomeStatus::Failed => 1,
            OutcomeStatus::Success | OutcomeStatus::Partial => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_failures_downgrade_to_partial() {
        let clean = EventOutcome::completed(EventKind::Test, None, Vec::new());
        assert_eq!(clean.status, OutcomeStatus::Success);

        let partial = EventOutcome::completed(
            EventKind::DownloadNew,
            Some("den".to_string()),
            vec![SoftFailure::HostUnreachable {
                host: "attic".to_string(),
            }],
        );
        assert_eq!(partial.status, OutcomeStatus::Partial);
        assert_eq!(partial.exit_code(), 0);
    }

    #[test]
    fn failed_outcome_exits_with_one() {
        let outcome = EventOutcome::failed(
            EventKind::Delete,
            None,
            RelayError::NoAvailableHost {
                event_kind: EventKind::Delete,
            },
            Vec::new(),
        );
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.status.as_str(), "failed");
    }

    #[test]
    fn soft_failure_display_names_host() {
        let failure = SoftFailure::NotifyFailed {
            host: "den".to_string(),
            detail: "timeout".to_string(),
        };
        assert_eq!(failure.to_string(), "den: notification failed: timeout");
    }
}
