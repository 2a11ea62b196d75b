//! On-screen notifications for processed events.
//!
//! # Design
//! - Message texts are derived from the event and the entries the executor imported or removed.
//! - Delivery goes to every reachable host whose settings allow the event kind; hosts are
//!   independent and failures are soft.

use futures_util::future::join_all;
use relayarr_config::RelayConfig;
use relayarr_events::{EventKind, LibraryEvent};
use relayarr_player_core::{EpisodeDetails, Notification};
use tracing::{debug, info, warn};

use crate::outcome::SoftFailure;
use crate::registry::ProbedHost;

/// Messages for `event`; per-episode events yield one message per episode.
#[must_use]
pub fn compose(
    event: &LibraryEvent,
    imported: &[EpisodeDetails],
    removed: &[EpisodeDetails],
) -> Vec<Notification> {
    let per_episode = |title: &str, episodes: &[EpisodeDetails]| -> Vec<Notification> {
        episodes
            .iter()
            .map(|episode| Notification::new(title, episode.to_string()))
            .collect()
    };

    match event {
        LibraryEvent::Grab {
            series,
            season,
            episode_numbers,
            episode_titles,
        } => episode_numbers
            .iter()
            .zip(episode_titles)
            .map(|(number, title)| {
                Notification::new(
                    "Sonarr - Attempting Download",
                    format!(
                        "{} - S{:02}E{number:02} - {title}",
                        series.title,
                        season.unwrap_or_default()
                    ),
                )
            })
            .collect(),
        LibraryEvent::DownloadNew { .. } => {
            per_episode("Sonarr - Downloaded New Episode", imported)
        }
        LibraryEvent::DownloadUpgrade { .. } => per_episode("Sonarr - Upgraded Episode", imported),
        LibraryEvent::Rename { .. } => per_episode("Sonarr - Renamed Episode", imported),
        LibraryEvent::Delete { .. } => per_episode("Sonarr - Deleted Episode", removed),
        LibraryEvent::SeriesAdd { series } => {
            vec![Notification::new("Sonarr - Series Added", series.label())]
        }
        LibraryEvent::SeriesDelete { series, .. } => {
            vec![Notification::new("Sonarr Deleted Show", series.label())]
        }
        LibraryEvent::HealthIssue { message, .. } => {
            vec![Notification::new("Sonarr - Health Issue", message.clone())]
        }
        LibraryEvent::HealthRestored { message, .. } => vec![Notification::new(
            "Sonarr - Health Restored",
            format!("{message} Resolved"),
        )],
        LibraryEvent::ApplicationUpdate { message, .. } => {
            vec![Notification::new("Sonarr - Application Update", message.clone())]
        }
        LibraryEvent::ManualInteractionRequired { series } => vec![Notification::new(
            "Sonarr - Manual Interaction Required",
            format!("Sonarr needs help with {}", series.label()),
        )],
        LibraryEvent::Test => vec![Notification::new("Sonarr - Testing", "Test Passed")],
    }
}

/// Send `notifications` to every eligible host.
pub async fn dispatch(
    config: &RelayConfig,
    probed: &[ProbedHost<'_>],
    kind: EventKind,
    notifications: &[Notification],
) -> Vec<SoftFailure> {
    if notifications.is_empty() {
        debug!("nothing to notify");
        return Vec::new();
    }
    let targets: Vec<&ProbedHost<'_>> = probed
        .iter()
        .filter(|host| host.state.reachable)
        .filter(|host| {
            let enabled = config.notifications_enabled(&host.host.config, kind);
            if !enabled {
                debug!(host = %host.name(), event_kind = %kind, "notifications suppressed");
            }
            enabled
        })
        .collect();
    info!(
        hosts = targets.len(),
        messages = notifications.len(),
        "sending notifications"
    );

    let results = join_all(targets.iter().map(|host| async move {
        let mut failures = Vec::new();
        for notification in notifications {
            if let Err(err) = host.client().notify(notification).await {
                warn!(host = %host.name(), error = %err, "notification failed");
                failures.push(SoftFailure::NotifyFailed {
                    host: host.name().to_string(),
                    detail: err.to_string(),
                });
            }
        }
        failures
    }))
    .await;
    results.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{HostRegistry, RegisteredHost};
    use relayarr_events::DeleteReason;
    use relayarr_test_support::fixtures::{episode, host_config, relay_config, series};
    use relayarr_test_support::mocks::{FakeHost, FakeLibrary};
    use std::sync::Arc;

    #[test]
    fn grab_lists_each_release_episode() {
        let event = LibraryEvent::Grab {
            series: series("Show", 2019),
            season: Some(2),
            episode_numbers: vec![3, 4],
            episode_titles: vec!["Three".to_string(), "Four".to_string()],
        };
        let messages: Vec<String> = compose(&event, &[], &[])
            .into_iter()
            .map(|note| note.message)
            .collect();
        assert_eq!(
            messages,
            vec!["Show - S02E03 - Three", "Show - S02E04 - Four"]
        );
    }

    #[test]
    fn per_episode_events_use_library_entries() {
        let removed = vec![episode("Show", "S01E01.mkv", 1, 1)];
        let event = LibraryEvent::Delete {
            series: series("Show", 2019),
            episode_file: "/data/tv/Show/S01E01.mkv".to_string(),
            reason: DeleteReason::Manual,
        };
        let notes = compose(&event, &[], &removed);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Sonarr - Deleted Episode");
        assert_eq!(notes[0].message, "Show - S01E01 - Episode 1");
    }

    #[test]
    fn fixed_texts_match_event() {
        let restored = LibraryEvent::HealthRestored {
            message: "Indexer reachable".to_string(),
            issue_type: None,
        };
        assert_eq!(compose(&restored, &[], &[])[0].message, "Indexer reachable Resolved");

        let manual = LibraryEvent::ManualInteractionRequired {
            series: series("Show", 2019),
        };
        assert_eq!(
            compose(&manual, &[], &[])[0].message,
            "Sonarr needs help with Show (2019)"
        );
        assert_eq!(compose(&LibraryEvent::Test, &[], &[])[0].message, "Test Passed");

        let deleted = LibraryEvent::SeriesDelete {
            series: series("Show", 2019),
            deleted_files: true,
        };
        let notes = compose(&deleted, &[], &[]);
        assert_eq!(notes[0].title, "Sonarr Deleted Show");
        assert_eq!(notes[0].message, "Show (2019)");
    }

    #[tokio::test]
    async fn suppressed_hosts_receive_nothing() {
        let library = FakeLibrary::new();
        let open = Arc::new(FakeHost::new("open", &library));
        let muted = Arc::new(FakeHost::new("muted", &library));
        let overridden = Arc::new(FakeHost::new("overridden", &library));

        let mut muted_config = host_config("muted", 1);
        muted_config.disable_notifications = true;
        let mut overridden_config = host_config("overridden", 2);
        overridden_config.notifications.insert(EventKind::Test, false);
        let config = relay_config(vec![
            host_config("open", 0),
            muted_config.clone(),
            overridden_config.clone(),
        ]);
        let registry = HostRegistry::new(vec![
            RegisteredHost::new(host_config("open", 0), open.clone()),
            RegisteredHost::new(muted_config, muted.clone()),
            RegisteredHost::new(overridden_config, overridden.clone()),
        ]);
        let probed = registry.probe_all().await;

        let notes = compose(&LibraryEvent::Test, &[], &[]);
        let failures = dispatch(&config, &probed, EventKind::Test, &notes).await;

        assert!(failures.is_empty());
        assert_eq!(open.notifications().len(), 1);
        assert!(muted.notifications().is_empty());
        assert!(overridden.notifications().is_empty());
    }

    #[tokio::test]
    async fn global_switch_disables_every_host() {
        let library = FakeLibrary::new();
        let host = Arc::new(FakeHost::new("open", &library));
        let mut config = relay_config(vec![host_config("open", 0)]);
        config.notifications.on_test = false;
        let registry = HostRegistry::new(vec![RegisteredHost::new(
            host_config("open", 0),
            host.clone(),
        )]);
        let probed = registry.probe_all().await;

        let notes = compose(&LibraryEvent::Test, &[], &[]);
        dispatch(&config, &probed, EventKind::Test, &notes).await;
        assert!(host.notifications().is_empty());
    }
}
