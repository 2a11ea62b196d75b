//! Mapping from library events to the operations the relay performs.
//!
//! # Design
//! - `ActionPlan::for_event` is the single place that decides what each event kind does.
//! - Plans carry source-side paths only; mapping to host paths happens once an executor is known.

use std::path::Path;

use relayarr_events::{DeleteReason, LibraryEvent};
use tracing::info;

use crate::companion::{episode_nfo, show_nfo};

/// Library work derived from one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPlan {
    /// No library change; notifications only.
    NotifyOnly,
    /// Import a new file with a directory-scoped scan.
    Import {
        /// Source-side series directory.
        series_dir: String,
    },
    /// Remove the entries of replaced files, rescan, and carry their metadata over.
    Replace {
        /// Source-side series directory.
        series_dir: String,
        /// Source-side files whose entries are replaced.
        old_files: Vec<String>,
    },
    /// Remove the entries of a deleted file and rescan its directory.
    Remove {
        /// Source-side series directory.
        series_dir: String,
        /// Source-side file that was deleted.
        file: String,
    },
    /// Stop playback of a file about to be replaced on disk; the follow-up import does the rest.
    HoldPlayback {
        /// Source-side file being replaced.
        file: String,
    },
    /// Full library scan for a newly added series.
    FullScan {
        /// Source-side series directory.
        series_dir: String,
    },
    /// Remove the show and all its entries.
    RemoveShow {
        /// Source-side series directory.
        series_dir: String,
    },
    /// Nothing to do at all.
    Skip,
}

impl ActionPlan {
    /// Plan for `event`.
    #[must_use]
    pub fn for_event(event: &LibraryEvent) -> Self {
        match event {
            LibraryEvent::Grab { .. }
            | LibraryEvent::HealthIssue { .. }
            | LibraryEvent::HealthRestored { .. }
            | LibraryEvent::ApplicationUpdate { .. }
            | LibraryEvent::ManualInteractionRequired { .. }
            | LibraryEvent::Test => Self::NotifyOnly,
            LibraryEvent::DownloadNew { series, .. } => Self::Import {
                series_dir: series.path.clone(),
            },
            LibraryEvent::DownloadUpgrade {
                series,
                deleted_paths,
                ..
            } => Self::Replace {
                series_dir: series.path.clone(),
                old_files: deleted_paths.clone(),
            },
            LibraryEvent::Rename {
                series,
                previous_paths,
                ..
            } => Self::Replace {
                series_dir: series.path.clone(),
                old_files: previous_paths.clone(),
            },
            LibraryEvent::Delete {
                episode_file,
                reason: DeleteReason::Upgrade,
                ..
            } => Self::HoldPlayback {
                file: episode_file.clone(),
            },
            LibraryEvent::Delete {
                series,
                episode_file,
                ..
            } => Self::Remove {
                series_dir: series.path.clone(),
                file: episode_file.clone(),
            },
            LibraryEvent::SeriesAdd { series } => Self::FullScan {
                series_dir: series.path.clone(),
            },
            LibraryEvent::SeriesDelete {
                series,
                deleted_files: true,
            } => Self::RemoveShow {
                series_dir: series.path.clone(),
            },
            LibraryEvent::SeriesDelete {
                deleted_files: false,
                ..
            } => Self::Skip,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotifyOnly => "notify_only",
            Self::Import { .. } => "import",
            Self::Replace { .. } => "replace",
            Self::Remove { .. } => "remove",
            Self::HoldPlayback { .. } => "hold_playback",
            Self::FullScan { .. } => "full_scan",
            Self::RemoveShow { .. } => "remove_show",
            Self::Skip => "skip",
        }
    }

    /// Whether the plan changes the shared library and therefore needs an executor.
    #[must_use]
    pub const fn changes_library(&self) -> bool {
        matches!(
            self,
            Self::Import { .. }
                | Self::Replace { .. }
                | Self::Remove { .. }
                | Self::FullScan { .. }
                | Self::RemoveShow { .. }
        )
    }

    /// Source-side files whose library entries are removed before the scan.
    #[must_use]
    pub fn removed_files(&self) -> Vec<&str> {
        match self {
            Self::Replace { old_files, .. } => old_files.iter().map(String::as_str).collect(),
            Self::Remove { file, .. } => vec![file.as_str()],
            _ => Vec::new(),
        }
    }

    /// Source-side paths that are stopped on every reachable host, independent of the executor.
    ///
    /// Directories are returned with `is_directory = true`.
    #[must_use]
    pub fn hold_targets(&self) -> Vec<(&str, bool)> {
        match self {
            Self::HoldPlayback { file } => vec![(file.as_str(), false)],
            Self::RemoveShow { series_dir } => vec![(series_dir.as_str(), true)],
            _ => Vec::new(),
        }
    }

    /// Whether interrupted playback on the executor is resumed once the plan ran.
    #[must_use]
    pub const fn resumes_playback(&self) -> bool {
        matches!(self, Self::Replace { .. })
    }
}

/// Source-side companion files the media manager writes for `event`.
#[must_use]
pub fn expected_companions(event: &LibraryEvent) -> Vec<String> {
    match event {
        LibraryEvent::DownloadNew {
            series,
            episode_file,
        }
        | LibraryEvent::DownloadUpgrade {
            series,
            episode_file,
            ..
        } => vec![episode_nfo(episode_file), show_nfo(&series.path)],
        LibraryEvent::Rename {
            series,
            relative_paths,
            ..
        } => relative_paths
            .iter()
            .map(|relative| {
                episode_nfo(&Path::new(&series.path).join(relative).to_string_lossy())
            })
            .chain(std::iter::once(show_nfo(&series.path)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Processing stages, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Event accepted.
    Received,
    /// Probing hosts and choosing the executor.
    HostSelecting,
    /// Stopping or waiting out playback on the executor.
    PlaybackHandling,
    /// Waiting for companion files.
    NfoWaiting,
    /// Reading metadata of affected entries.
    MetadataCapturing,
    /// Running the library operation.
    Executing,
    /// Writing captured metadata onto new entries.
    MetadataReconciling,
    /// Restarting interrupted playback.
    PlaybackResuming,
    /// Refreshing secondary hosts.
    Broadcasting,
    /// Sending notifications.
    Notifying,
    /// Finished without a fatal failure.
    Completed,
    /// Stopped on a fatal failure.
    Failed,
}

impl Stage {
    /// Lowercase label for the `stage` log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::HostSelecting => "host_selecting",
            Self::PlaybackHandling => "playback_handling",
            Self::NfoWaiting => "nfo_waiting",
            Self::MetadataCapturing => "metadata_capturing",
            Self::Executing => "executing",
            Self::MetadataReconciling => "metadata_reconciling",
            Self::PlaybackResuming => "playback_resuming",
            Self::Broadcasting => "broadcasting",
            Self::Notifying => "notifying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Log the transition into this stage.
    pub fn enter(self) {
        info!(stage = self.as_str(), "stage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayarr_events::Series;

    fn show() -> Series {
        Series {
            title: "Show".to_string(),
            year: Some(2020),
            path: "/data/tv/Show".to_string(),
        }
    }

    #[test]
    fn deletes_split_on_reason() {
        let upgrade = LibraryEvent::Delete {
            series: show(),
            episode_file: "/data/tv/Show/S01E01.mkv".to_string(),
            reason: DeleteReason::Upgrade,
        };
        assert_eq!(
            ActionPlan::for_event(&upgrade),
            ActionPlan::HoldPlayback {
                file: "/data/tv/Show/S01E01.mkv".to_string()
            }
        );

        let manual = LibraryEvent::Delete {
            series: show(),
            episode_file: "/data/tv/Show/S01E01.mkv".to_string(),
            reason: DeleteReason::Manual,
        };
        let plan = ActionPlan::for_event(&manual);
        assert!(plan.changes_library());
        assert_eq!(plan.removed_files(), vec!["/data/tv/Show/S01E01.mkv"]);
        assert!(!plan.resumes_playback());
    }

    #[test]
    fn series_delete_without_files_is_skipped() {
        let event = LibraryEvent::SeriesDelete {
            series: show(),
            deleted_files: false,
        };
        assert_eq!(ActionPlan::for_event(&event), ActionPlan::Skip);

        let removal = LibraryEvent::SeriesDelete {
            series: show(),
            deleted_files: true,
        };
        let plan = ActionPlan::for_event(&removal);
        assert_eq!(plan.hold_targets(), vec![("/data/tv/Show", true)]);
    }

    #[test]
    fn rename_replaces_previous_paths() {
        let event = LibraryEvent::Rename {
            series: show(),
            previous_paths: vec!["/data/tv/Show/old.mkv".to_string()],
            relative_paths: vec!["Season 1/new.mkv".to_string()],
        };
        let plan = ActionPlan::for_event(&event);
        assert!(plan.resumes_playback());
        assert_eq!(plan.removed_files(), vec!["/data/tv/Show/old.mkv"]);
        assert_eq!(
            expected_companions(&event),
            vec![
                "/data/tv/Show/Season 1/new.nfo".to_string(),
                "/data/tv/Show/tvshow.nfo".to_string()
            ]
        );
    }

    #[test]
    fn informational_events_only_notify() {
        assert_eq!(ActionPlan::for_event(&LibraryEvent::Test), ActionPlan::NotifyOnly);
        assert!(!ActionPlan::NotifyOnly.changes_library());
        assert!(expected_companions(&LibraryEvent::Test).is_empty());
    }
}
