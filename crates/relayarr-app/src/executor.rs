//! Library work on the single executor host of an event.
//!
//! # Design
//! - Selection walks reachable candidates in priority order; at most one host executes.
//! - Scans and cleans are polled to completion within their configured budgets.
//! - New entries are the difference between directory snapshots taken around the scan.
//! - Metadata is reapplied, and playback resumed, only after the primary operation succeeded.

use std::collections::BTreeSet;
use std::time::Duration;

use relayarr_config::{HostConfig, RelayConfig};
use relayarr_events::{EventKind, LibraryEvent};
use relayarr_player_core::{ActivePlayer, EpisodeDetails, HostError, MediaHost, Platform};
use relayarr_telemetry::record_executor;
use tracing::{debug, info, warn};

use crate::companion::{CompanionFiles, wait_for_files};
use crate::metadata;
use crate::outcome::{RelayError, SoftFailure};
use crate::path_map::PathMapper;
use crate::plan::{ActionPlan, Stage, expected_companions};
use crate::playback::{self, ResumeToken};
use crate::polling::{Backoff, PollOutcome, poll_until};
use crate::registry::ProbedHost;

/// What the executor did, filled in as processing advances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Host chosen to run the library operation.
    pub executor: Option<String>,
    /// Entries that appeared in the library because of the operation.
    pub imported: Vec<EpisodeDetails>,
    /// Entries removed from the library.
    pub removed: Vec<EpisodeDetails>,
    /// Soft failures in the order they happened.
    pub soft_failures: Vec<SoftFailure>,
}

/// How an import treats an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportKind {
    /// A new file; unknown shows get a full scan.
    NewFile,
    /// Files replacing removed entries.
    Replacement,
    /// Rescan after a delete; finding nothing is expected.
    Deletion,
}

impl ImportKind {
    const fn expects_new_entries(self) -> bool {
        matches!(self, Self::NewFile | Self::Replacement)
    }
}

/// Host-side view of source paths for one host.
struct HostPaths<'a> {
    mapper: &'a PathMapper,
    config: &'a HostConfig,
    platform: Platform,
}

impl HostPaths<'_> {
    fn file(&self, source: &str) -> String {
        self.mapper.map(source, self.config, self.platform)
    }

    fn directory(&self, source: &str) -> String {
        self.mapper.map_directory(source, self.config, self.platform)
    }
}

/// Runs the library side of one event.
pub struct LibraryExecutor<'a> {
    config: &'a RelayConfig,
    mapper: &'a PathMapper,
    files: &'a dyn CompanionFiles,
    kind: EventKind,
}

impl<'a> LibraryExecutor<'a> {
    /// Executor for an event of `kind`.
    #[must_use]
    pub const fn new(
        config: &'a RelayConfig,
        mapper: &'a PathMapper,
        files: &'a dyn CompanionFiles,
        kind: EventKind,
    ) -> Self {
        Self {
            config,
            mapper,
            files,
            kind,
        }
    }

    /// Pick the executor among `probed`, which must be in candidate order.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NoAvailableHost`] when no reachable host qualifies.
    pub async fn select<'p, 'h>(
        &self,
        probed: &'p [ProbedHost<'h>],
    ) -> Result<&'p ProbedHost<'h>, RelayError> {
        for host in probed.iter().filter(|host| host.state.reachable) {
            if !self.config.library.skip_active || !host.state.is_playing {
                return Ok(host);
            }
            info!(host = %host.name(), "host is playing, waiting for playback to end");
            let budget = self.config.timeouts.playback_wait();
            if wait_until_idle(host.client(), budget).await == PollOutcome::Ready {
                return Ok(host);
            }
            warn!(
                host = %host.name(),
                waited_secs = budget.as_secs(),
                "playback did not end in time, trying next host"
            );
        }
        Err(RelayError::NoAvailableHost {
            event_kind: self.kind,
        })
    }

    /// Run `plan` for `event` on `host`, recording progress in `report`.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError`] when the primary library operation fails or times out.
    pub async fn run(
        &self,
        event: &LibraryEvent,
        plan: &ActionPlan,
        host: &ProbedHost<'_>,
        report: &mut ExecutionReport,
    ) -> Result<(), RelayError> {
        report.executor = Some(host.name().to_string());
        record_executor(host.name());
        info!(host = %host.name(), plan = plan.as_str(), "executor selected");

        let client = host.client();
        let paths = HostPaths {
            mapper: self.mapper,
            config: &host.host.config,
            platform: host.state.platform,
        };
        let old_files: Vec<String> = plan
            .removed_files()
            .into_iter()
            .map(|file| paths.file(file))
            .collect();

        let token = if self.config.library.skip_active || !host.state.is_playing_any(&old_files) {
            None
        } else {
            Stage::PlaybackHandling.enter();
            interrupt(client, &old_files, report).await
        };

        if self.config.library.wait_for_nfo {
            self.wait_for_companions(event, report).await;
        }

        Stage::MetadataCapturing.enter();
        let (captured, failures) = metadata::capture(client, &old_files).await;
        report.soft_failures.extend(failures);

        Stage::Executing.enter();
        let mut needs_clean = self.config.library.clean_after_update;
        match plan {
            ActionPlan::Import { series_dir } => {
                let directory = paths.directory(series_dir);
                self.import(host, &directory, ImportKind::NewFile, report)
                    .await?;
            }
            ActionPlan::Replace { series_dir, .. } => {
                needs_clean |= remove_entries(client, &captured, report).await;
                let directory = paths.directory(series_dir);
                self.import(host, &directory, ImportKind::Replacement, report)
                    .await?;
            }
            ActionPlan::Remove { series_dir, .. } => {
                needs_clean |= remove_entries(client, &captured, report).await;
                let directory = paths.directory(series_dir);
                self.import(host, &directory, ImportKind::Deletion, report)
                    .await?;
            }
            ActionPlan::FullScan { series_dir } => {
                let directory = paths.directory(series_dir);
                let before = self.snapshot(host, &directory).await?;
                self.scan_and_wait(host, None).await?;
                report.imported = self.new_entries(host, &directory, &before).await?;
                if report.imported.is_empty() {
                    report
                        .soft_failures
                        .push(SoftFailure::NothingImported { directory });
                }
            }
            ActionPlan::RemoveShow { series_dir } => {
                let directory = paths.directory(series_dir);
                self.remove_show(host, &directory).await?;
            }
            ActionPlan::NotifyOnly | ActionPlan::HoldPlayback { .. } | ActionPlan::Skip => {}
        }
        if needs_clean {
            self.clean(host, report).await;
        }

        if !captured.is_empty() {
            Stage::MetadataReconciling.enter();
            let failures = metadata::reapply(client, &captured, &report.imported).await;
            report.soft_failures.extend(failures);
        }

        if let Some(token) = token {
            if plan.resumes_playback() {
                Stage::PlaybackResuming.enter();
                if let Some(failure) = playback::resume(client, &token, &report.imported).await {
                    report.soft_failures.push(failure);
                }
            } else {
                info!(file = %token.file, "playback stopped for removed item");
            }
        }
        Ok(())
    }

    async fn wait_for_companions(&self, event: &LibraryEvent, report: &mut ExecutionReport) {
        let expected = expected_companions(event);
        if expected.is_empty() {
            return;
        }
        Stage::NfoWaiting.enter();
        let budget = self.config.library.nfo_timeout(expected.len());
        let missing = wait_for_files(self.files, &expected, budget).await;
        if !missing.is_empty() {
            report
                .soft_failures
                .push(SoftFailure::NfoWaitTimeout { missing });
        }
    }

    async fn import(
        &self,
        host: &ProbedHost<'_>,
        directory: &str,
        kind: ImportKind,
        report: &mut ExecutionReport,
    ) -> Result<(), RelayError> {
        let before = self.snapshot(host, directory).await?;
        let known_show = kind != ImportKind::NewFile || show_known(host.client(), directory).await;
        let fallback =
            self.config.library.full_scan_fallback && known_show && kind.expects_new_entries();

        let scanned = if known_show {
            self.scan_and_wait(host, Some(directory)).await
        } else {
            info!(directory = %directory, "show not in library, running full scan");
            self.scan_and_wait(host, None).await
        };
        let mut imported = match scanned {
            Ok(()) => self.new_entries(host, directory, &before).await?,
            Err(err) if fallback => {
                warn!(directory = %directory, error = %err, "directory scan failed");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        if imported.is_empty() && fallback {
            info!(directory = %directory, "no new entries, falling back to full scan");
            self.scan_and_wait(host, None).await?;
            imported = self.new_entries(host, directory, &before).await?;
        }
        if imported.is_empty() && kind.expects_new_entries() {
            warn!(directory = %directory, "scan found no new entries");
            report.soft_failures.push(SoftFailure::NothingImported {
                directory: directory.to_string(),
            });
        } else {
            info!(directory = %directory, entries = imported.len(), "library updated");
        }
        report.imported = imported;
        Ok(())
    }

    async fn snapshot(
        &self,
        host: &ProbedHost<'_>,
        directory: &str,
    ) -> Result<Vec<EpisodeDetails>, RelayError> {
        host.client()
            .episodes_in_directory(directory)
            .await
            .map_err(|source| self.remote_error(host, Some(directory), source))
    }

    async fn new_entries(
        &self,
        host: &ProbedHost<'_>,
        directory: &str,
        before: &[EpisodeDetails],
    ) -> Result<Vec<EpisodeDetails>, RelayError> {
        let known: BTreeSet<_> = before.iter().map(|episode| episode.id).collect();
        let after = self.snapshot(host, directory).await?;
        Ok(after
            .into_iter()
            .filter(|episode| !known.contains(&episode.id))
            .collect())
    }

    async fn scan_and_wait(
        &self,
        host: &ProbedHost<'_>,
        directory: Option<&str>,
    ) -> Result<(), RelayError> {
        let client = host.client();
        client
            .scan(directory)
            .await
            .map_err(|source| self.remote_error(host, directory, source))?;
        debug!(host = %host.name(), directory = ?directory, "scan started");

        match wait_until_settled(client, self.config.timeouts.scan()).await {
            PollOutcome::Ready => Ok(()),
            PollOutcome::TimedOut => Err(RelayError::RemoteOperationTimeout {
                event_kind: self.kind,
                host: host.name().to_string(),
                operation: "scan",
                path: directory.map(str::to_string),
            }),
        }
    }

    async fn clean(&self, host: &ProbedHost<'_>, report: &mut ExecutionReport) {
        let client = host.client();
        let detail = match client.clean().await {
            Ok(()) => match wait_until_settled(client, self.config.timeouts.clean()).await {
                PollOutcome::Ready => {
                    info!(host = %host.name(), "library cleaned");
                    return;
                }
                PollOutcome::TimedOut => "clean did not finish in time".to_string(),
            },
            Err(err) => err.to_string(),
        };
        warn!(host = %host.name(), detail = %detail, "library clean failed");
        report.soft_failures.push(SoftFailure::CleanFailed {
            host: host.name().to_string(),
            detail,
        });
    }

    async fn remove_show(&self, host: &ProbedHost<'_>, directory: &str) -> Result<(), RelayError> {
        let client = host.client();
        let shows = client
            .shows_in_directory(directory)
            .await
            .map_err(|source| self.remote_error(host, Some(directory), source))?;
        if shows.is_empty() {
            info!(directory = %directory, "show not in library, nothing to remove");
        }
        for show in shows {
            client
                .remove_show(show.id)
                .await
                .map_err(|source| self.remote_error(host, Some(&show.file), source))?;
            info!(show = %show.title, "removed show");
        }
        Ok(())
    }

    fn remote_error(
        &self,
        host: &ProbedHost<'_>,
        path: Option<&str>,
        source: HostError,
    ) -> RelayError {
        RelayError::RemoteOperation {
            event_kind: self.kind,
            host: host.name().to_string(),
            path: path.map(str::to_string),
            source,
        }
    }
}

async fn interrupt(
    client: &dyn MediaHost,
    targets: &[String],
    report: &mut ExecutionReport,
) -> Option<ResumeToken> {
    match playback::interrupt(client, targets).await {
        Ok(token) => token,
        Err(err) => {
            warn!(host = %client.name(), error = %err, "failed to stop playback");
            report.soft_failures.push(SoftFailure::PlaybackStopFailed {
                host: client.name().to_string(),
                detail: err.to_string(),
            });
            None
        }
    }
}

async fn show_known(client: &dyn MediaHost, directory: &str) -> bool {
    match client.shows_in_directory(directory).await {
        Ok(shows) => !shows.is_empty(),
        Err(err) => {
            warn!(directory = %directory, error = %err, "show lookup failed, assuming known");
            true
        }
    }
}

/// Remove captured entries; returns whether a clean is needed to finish the job.
async fn remove_entries(
    client: &dyn MediaHost,
    captured: &[EpisodeDetails],
    report: &mut ExecutionReport,
) -> bool {
    let mut failed = false;
    for entry in captured {
        match client.remove_episode(entry.id).await {
            Ok(()) => {
                info!(episode = %entry, "removed library entry");
                report.removed.push(entry.clone());
            }
            Err(err) => {
                warn!(episode = %entry, error = %err, "failed to remove library entry");
                failed = true;
            }
        }
    }
    failed || captured.is_empty()
}

async fn wait_until_settled(client: &dyn MediaHost, budget: Duration) -> PollOutcome {
    poll_until(budget, Backoff::SCAN, move || async move {
        client.is_scanning().await.is_ok_and(|scanning| !scanning)
    })
    .await
}

async fn wait_until_idle(client: &dyn MediaHost, budget: Duration) -> PollOutcome {
    poll_until(budget, Backoff::PLAYBACK, move || async move {
        client
            .active_players()
            .await
            .is_ok_and(|players| !players.iter().any(ActivePlayer::is_video))
    })
    .await
}
