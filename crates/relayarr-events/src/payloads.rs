//! Event payload types consumed by the orchestrator.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Series the event refers to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Series {
    /// Display title of the series.
    pub title: String,
    /// First-aired year when the media manager supplied one.
    pub year: Option<i32>,
    /// Source-side root directory of the series.
    pub path: String,
}

impl Series {
    /// `Title (Year)` label used in notifications.
    #[must_use]
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({year})", self.title),
            None => self.title.clone(),
        }
    }
}

/// Why the media manager deleted an episode file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteReason {
    /// File is being replaced by a better release; a download event follows.
    Upgrade,
    /// A user removed the file.
    Manual,
    /// The file vanished from disk.
    MissingFromDisk,
    /// Any other reason string.
    Other(String),
}

impl DeleteReason {
    /// Parse the reason string supplied by the media manager.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "upgrade" => Self::Upgrade,
            "manual" | "manualoverride" => Self::Manual,
            "missingfromdisk" => Self::MissingFromDisk,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

/// Discriminator for [`LibraryEvent`], also used as the notification settings key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Release grabbed, download not started yet.
    Grab,
    /// New episode file imported.
    DownloadNew,
    /// Existing episode file replaced by a better one.
    DownloadUpgrade,
    /// Episode files renamed on disk.
    Rename,
    /// Episode file deleted.
    Delete,
    /// Series added to the media manager.
    SeriesAdd,
    /// Series removed from the media manager.
    SeriesDelete,
    /// Media manager reported a health problem.
    HealthIssue,
    /// Health problem cleared.
    HealthRestored,
    /// Media manager updated itself.
    ApplicationUpdate,
    /// Import is blocked on the user.
    ManualInteractionRequired,
    /// Connection test from the media manager settings page.
    Test,
}

impl EventKind {
    /// Every kind, in configuration order.
    pub const ALL: [Self; 12] = [
        Self::Grab,
        Self::DownloadNew,
        Self::DownloadUpgrade,
        Self::Rename,
        Self::Delete,
        Self::SeriesAdd,
        Self::SeriesDelete,
        Self::HealthIssue,
        Self::HealthRestored,
        Self::ApplicationUpdate,
        Self::ManualInteractionRequired,
        Self::Test,
    ];

    /// Machine-friendly name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grab => "grab",
            Self::DownloadNew => "download_new",
            Self::DownloadUpgrade => "download_upgrade",
            Self::Rename => "rename",
            Self::Delete => "delete",
            Self::SeriesAdd => "series_add",
            Self::SeriesDelete => "series_delete",
            Self::HealthIssue => "health_issue",
            Self::HealthRestored => "health_restored",
            Self::ApplicationUpdate => "application_update",
            Self::ManualInteractionRequired => "manual_interaction_required",
            Self::Test => "test",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Normalised library-change event. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LibraryEvent {
    /// A release was grabbed for download.
    Grab {
        /// Series the release belongs to.
        series: Series,
        /// Season number of the release.
        season: Option<u32>,
        /// Episode numbers contained in the release.
        episode_numbers: Vec<u32>,
        /// Episode titles, index-aligned with `episode_numbers`.
        episode_titles: Vec<String>,
    },
    /// A new episode file was imported.
    DownloadNew {
        /// Series the file belongs to.
        series: Series,
        /// Source-side path of the imported file.
        episode_file: String,
    },
    /// An episode file replaced older files.
    DownloadUpgrade {
        /// Series the file belongs to.
        series: Series,
        /// Source-side path of the imported file.
        episode_file: String,
        /// Source-side paths of the replaced files.
        deleted_paths: Vec<String>,
    },
    /// Episode files were renamed.
    Rename {
        /// Series the files belong to.
        series: Series,
        /// Source-side paths before the rename.
        previous_paths: Vec<String>,
        /// New paths relative to the series directory.
        relative_paths: Vec<String>,
    },
    /// An episode file was deleted.
    Delete {
        /// Series the file belonged to.
        series: Series,
        /// Source-side path of the deleted file.
        episode_file: String,
        /// Reason reported by the media manager.
        reason: DeleteReason,
    },
    /// A series was added.
    SeriesAdd {
        /// The new series.
        series: Series,
    },
    /// A series was removed.
    SeriesDelete {
        /// The removed series.
        series: Series,
        /// Whether the series files were deleted from disk.
        deleted_files: bool,
    },
    /// A health check failed.
    HealthIssue {
        /// Human-readable health message.
        message: String,
        /// Health check type identifier.
        issue_type: Option<String>,
    },
    /// A health check recovered.
    HealthRestored {
        /// Human-readable health message.
        message: String,
        /// Health check type identifier.
        issue_type: Option<String>,
    },
    /// The media manager updated itself.
    ApplicationUpdate {
        /// Update message.
        message: String,
        /// Version before the update.
        previous_version: Option<String>,
        /// Version after the update.
        new_version: Option<String>,
    },
    /// An import needs manual intervention.
    ManualInteractionRequired {
        /// Series the stuck import belongs to.
        series: Series,
    },
    /// Connection test.
    Test,
}

impl LibraryEvent {
    /// Discriminator for this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Grab { .. } => EventKind::Grab,
            Self::DownloadNew { .. } => EventKind::DownloadNew,
            Self::DownloadUpgrade { .. } => EventKind::DownloadUpgrade,
            Self::Rename { .. } => EventKind::Rename,
            Self::Delete { .. } => EventKind::Delete,
            Self::SeriesAdd { .. } => EventKind::SeriesAdd,
            Self::SeriesDelete { .. } => EventKind::SeriesDelete,
            Self::HealthIssue { .. } => EventKind::HealthIssue,
            Self::HealthRestored { .. } => EventKind::HealthRestored,
            Self::ApplicationUpdate { .. } => EventKind::ApplicationUpdate,
            Self::ManualInteractionRequired { .. } => EventKind::ManualInteractionRequired,
            Self::Test => EventKind::Test,
        }
    }

    /// Series carried by the event, if any.
    #[must_use]
    pub const fn series(&self) -> Option<&Series> {
        match self {
            Self::Grab { series, .. }
            | Self::DownloadNew { series, .. }
            | Self::DownloadUpgrade { series, .. }
            | Self::Rename { series, .. }
            | Self::Delete { series, .. }
            | Self::SeriesAdd { series }
            | Self::SeriesDelete { series, .. }
            | Self::ManualInteractionRequired { series } => Some(series),
            Self::HealthIssue { .. }
            | Self::HealthRestored { .. }
            | Self::ApplicationUpdate { .. }
            | Self::Test => None,
        }
    }

    /// Source-side paths whose library items the event replaces or removes.
    #[must_use]
    pub fn affected_paths(&self) -> Vec<&str> {
        match self {
            Self::DownloadUpgrade { deleted_paths, .. } => {
                deleted_paths.iter().map(String::as_str).collect()
            }
            Self::Rename { previous_paths, .. } => {
                previous_paths.iter().map(String::as_str).collect()
            }
            Self::Delete { episode_file, .. } => vec![episode_file.as_str()],
            _ => Vec::new(),
        }
    }
}
