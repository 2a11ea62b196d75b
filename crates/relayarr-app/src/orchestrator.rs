//! Event processing pipeline.
//!
//! # Design
//! - `process` is serialized; one event runs start to finish before the next is accepted.
//! - Hosts are probed fresh for every event and unreachable ones are recorded as soft failures.
//! - The whole run is bounded by the event budget; remote effects already applied stay applied.

use std::sync::Arc;

use relayarr_config::RelayConfig;
use relayarr_events::LibraryEvent;
use relayarr_player_core::MediaHost;
use relayarr_telemetry::event_span;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::broadcast::refresh_secondaries;
use crate::companion::CompanionFiles;
use crate::executor::{ExecutionReport, LibraryExecutor};
use crate::notify;
use crate::outcome::{EventOutcome, RelayError, SoftFailure};
use crate::path_map::PathMapper;
use crate::plan::{ActionPlan, Stage};
use crate::playback;
use crate::registry::{HostRegistry, ProbedHost};

/// Relays library events to the configured media hosts.
pub struct Orchestrator {
    config: Arc<RelayConfig>,
    registry: HostRegistry,
    mapper: PathMapper,
    files: Arc<dyn CompanionFiles>,
    gate: Mutex<()>,
}

impl Orchestrator {
    /// Orchestrator over an immutable host snapshot.
    #[must_use]
    pub fn new(
        config: Arc<RelayConfig>,
        registry: HostRegistry,
        files: Arc<dyn CompanionFiles>,
    ) -> Self {
        let mapper = PathMapper::new(config.library.path_mapping.clone());
        Self {
            config,
            registry,
            mapper,
            files,
            gate: Mutex::new(()),
        }
    }

    /// Process one event to completion and report what happened.
    pub async fn process(&self, event: &LibraryEvent, run_id: Uuid) -> EventOutcome {
        let serialized = self.gate.lock().await;
        let span = event_span(event.kind().as_str(), &run_id.to_string());
        let outcome = self.process_bounded(event).instrument(span).await;
        drop(serialized);
        outcome
    }

    async fn process_bounded(&self, event: &LibraryEvent) -> EventOutcome {
        let kind = event.kind();
        let budget = self.config.timeouts.event();
        let mut report = ExecutionReport::default();
        let result = timeout(budget, self.run(event, &mut report))
            .await
            .unwrap_or(Err(RelayError::EventBudgetExceeded {
                event_kind: kind,
                budget,
            }));

        match result {
            Ok(()) => {
                Stage::Completed.enter();
                EventOutcome::completed(kind, report.executor, report.soft_failures)
            }
            Err(reason) => {
                Stage::Failed.enter();
                error!(error = %reason, detail = ?reason, "event failed");
                EventOutcome::failed(kind, report.executor, reason, report.soft_failures)
            }
        }
    }

    async fn run(
        &self,
        event: &LibraryEvent,
        report: &mut ExecutionReport,
    ) -> Result<(), RelayError> {
        let kind = event.kind();
        Stage::Received.enter();
        let plan = ActionPlan::for_event(event);
        info!(plan = plan.as_str(), "event received");
        if plan == ActionPlan::Skip {
            info!("series removed without files, nothing to do");
            return Ok(());
        }

        Stage::HostSelecting.enter();
        let probed = self.registry.probe_all().await;
        for host in probed.iter().filter(|host| !host.state.reachable) {
            warn!(host = %host.name(), "host unreachable");
            report.soft_failures.push(SoftFailure::HostUnreachable {
                host: host.name().to_string(),
            });
        }
        if !probed.iter().any(|host| host.state.reachable) {
            return Err(RelayError::NoAvailableHost { event_kind: kind });
        }

        self.hold_playback(&plan, &probed, report).await;

        if plan.changes_library() {
            let executor =
                LibraryExecutor::new(&self.config, &self.mapper, self.files.as_ref(), kind);
            let host = executor.select(&probed).await?;
            executor.run(event, &plan, host, report).await?;
        }

        if matches!(plan, ActionPlan::Import { .. }) && report.imported.is_empty() {
            info!("nothing imported, skipping refresh and notifications");
            return Ok(());
        }

        if let Some(executor) = report.executor.as_deref() {
            Stage::Broadcasting.enter();
            let failures = refresh_secondaries(&probed, executor).await;
            report.soft_failures.extend(failures);
        }

        Stage::Notifying.enter();
        let notifications = notify::compose(event, &report.imported, &report.removed);
        let failures = notify::dispatch(&self.config, &probed, kind, &notifications).await;
        report.soft_failures.extend(failures);
        Ok(())
    }

    async fn hold_playback(
        &self,
        plan: &ActionPlan,
        probed: &[ProbedHost<'_>],
        report: &mut ExecutionReport,
    ) {
        let holds = plan.hold_targets();
        if holds.is_empty() {
            return;
        }
        Stage::PlaybackHandling.enter();
        let targets: Vec<(&dyn MediaHost, Vec<String>)> = probed
            .iter()
            .filter(|host| host.state.reachable)
            .filter_map(|host| {
                let config = &host.host.config;
                let platform = host.state.platform;
                let mapped: Vec<String> = holds
                    .iter()
                    .map(|&(path, is_directory)| {
                        if is_directory {
                            self.mapper.map_directory(path, config, platform)
                        } else {
                            self.mapper.map(path, config, platform)
                        }
                    })
                    .collect();
                if host.state.is_playing_any(&mapped) {
                    Some((host.client(), mapped))
                } else {
                    None
                }
            })
            .collect();
        report.soft_failures.extend(playback::hold(&targets).await);
    }
}
