//! Stops playback of items about to change and restarts it afterwards.
//!
//! # Design
//! - Only video players whose item file matches an affected path (or lies under an affected
//!   directory) are touched.
//! - A resume token remembers the episode identity and position, so playback can move to the
//!   replacement entry created by a rescan.

use std::time::Duration;

use futures_util::future::join_all;
use relayarr_player_core::{EpisodeDetails, EpisodeId, HostResult, MediaHost};
use tracing::{info, warn};

use crate::outcome::SoftFailure;

/// Playback interrupted by the relay.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeToken {
    /// Library entry that was playing, when the player reported one.
    pub episode: Option<EpisodeDetails>,
    /// Host-side file that was playing.
    pub file: String,
    /// Elapsed time at the stop.
    pub position: Duration,
}

impl ResumeToken {
    /// Entry to restart: the replacement of the stopped episode when one exists, otherwise
    /// the stopped entry itself.
    #[must_use]
    pub fn resume_target(&self, replacements: &[EpisodeDetails]) -> Option<EpisodeId> {
        let stopped = self.episode.as_ref()?;
        Some(
            replacements
                .iter()
                .find(|candidate| candidate.same_episode(stopped))
                .map_or(stopped.id, |replacement| replacement.id),
        )
    }
}

/// Whether `file` is one of `targets` or lies under a target directory.
pub(crate) fn matches_target(file: &str, targets: &[String]) -> bool {
    targets.iter().any(|target| {
        file == target || (target.ends_with(['/', '\\']) && file.starts_with(target.as_str()))
    })
}

/// Stop a video player on `host` whose item matches one of `targets`.
///
/// # Errors
///
/// Returns the host error if player state cannot be read or the stop is rejected.
pub async fn interrupt(
    host: &dyn MediaHost,
    targets: &[String],
) -> HostResult<Option<ResumeToken>> {
    for player in host.active_players().await? {
        if !player.is_video() {
            continue;
        }
        let Some(item) = host.player_item(player.id).await? else {
            continue;
        };
        let Some(file) = item.file.clone() else {
            continue;
        };
        if !matches_target(&file, targets) {
            continue;
        }

        let position = host.player_position(player.id).await?;
        let episode = match item.episode_id() {
            Some(id) => host.episode(id).await.ok(),
            None => None,
        };
        host.stop(player.id).await?;
        info!(
            host = %host.name(),
            file = %file,
            position_secs = position.elapsed.as_secs(),
            "stopped playback"
        );
        return Ok(Some(ResumeToken {
            episode,
            file,
            position: position.elapsed,
        }));
    }
    Ok(None)
}

/// Restart interrupted playback on `host`, preferring a replacement entry.
///
/// Failures are reported as soft failures, never escalated.
pub async fn resume(
    host: &dyn MediaHost,
    token: &ResumeToken,
    replacements: &[EpisodeDetails],
) -> Option<SoftFailure> {
    let Some(target) = token.resume_target(replacements) else {
        warn!(host = %host.name(), file = %token.file, "no library entry to resume");
        return Some(SoftFailure::PlaybackResumeFailed {
            host: host.name().to_string(),
            detail: format!("no library entry for {}", token.file),
        });
    };
    match host.play_episode(target, Some(token.position)).await {
        Ok(()) => {
            info!(host = %host.name(), episode_id = target, "resumed playback");
            None
        }
        Err(err) => {
            warn!(host = %host.name(), error = %err, "failed to resume playback");
            Some(SoftFailure::PlaybackResumeFailed {
                host: host.name().to_string(),
                detail: err.to_string(),
            })
        }
    }
}

/// Stop matching playback on every given host without planning a resume.
///
/// Each entry pairs a host with its host-side targets.
pub async fn hold(hosts: &[(&dyn MediaHost, Vec<String>)]) -> Vec<SoftFailure> {
    let results = join_all(
        hosts
            .iter()
            .map(|(host, targets)| async move { (*host, interrupt(*host, targets).await) }),
    )
    .await;
    results
        .into_iter()
        .filter_map(|(host, result)| match result {
            Ok(_) => None,
            Err(err) => {
                warn!(host = %host.name(), error = %err, "failed to hold playback");
                Some(SoftFailure::PlaybackStopFailed {
                    host: host.name().to_string(),
                    detail: err.to_string(),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayarr_test_support::fixtures::{episode, host_dir};
    use relayarr_test_support::mocks::{Failures, FakeHost, FakeLibrary, HostCall};

    #[tokio::test]
    async fn interrupt_stops_matching_player_and_captures_position() -> anyhow::Result<()> {
        let library = FakeLibrary::new();
        let stored = library.insert(episode("Show", "S01E01.mkv", 1, 1));
        let host = FakeHost::new("den", &library).playing(4, &stored, Duration::from_secs(754));

        let token = interrupt(&host, &[stored.file.clone()]).await?;
        let token = token.ok_or_else(|| anyhow::anyhow!("expected a resume token"))?;
        assert_eq!(token.position, Duration::from_secs(754));
        assert_eq!(token.episode.as_ref().map(|ep| ep.id), Some(stored.id));
        assert!(!host.is_playing());
        assert!(host.calls().contains(&HostCall::Stop(4)));
        Ok(())
    }

    #[tokio::test]
    async fn interrupt_ignores_unrelated_playback() -> anyhow::Result<()> {
        let library = FakeLibrary::new();
        let stored = library.insert(episode("Other", "S01E01.mkv", 1, 1));
        let host = FakeHost::new("den", &library).playing(1, &stored, Duration::from_secs(5));

        assert!(interrupt(&host, &[host_dir("Show")]).await?.is_none());
        assert!(host.is_playing());
        Ok(())
    }

    #[tokio::test]
    async fn directory_targets_match_contained_files() -> anyhow::Result<()> {
        let library = FakeLibrary::new();
        let stored = library.insert(episode("Show", "S02E03.mkv", 2, 3));
        let host = FakeHost::new("den", &library).playing(1, &stored, Duration::from_secs(5));

        assert!(interrupt(&host, &[host_dir("Show")]).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn resume_moves_to_replacement_entry() {
        let library = FakeLibrary::new();
        let old = episode("Show", "S01E01.mkv", 1, 1);
        let replacement = library.insert(episode("Show", "S01E01.2160p.mkv", 1, 1));
        let token = ResumeToken {
            episode: Some(EpisodeDetails { id: 99, ..old }),
            file: "/mnt/tv/Show/S01E01.mkv".to_string(),
            position: Duration::from_secs(60),
        };
        let host = FakeHost::new("den", &library);

        assert!(resume(&host, &token, std::slice::from_ref(&replacement)).await.is_none());
        assert!(host.calls().contains(&HostCall::PlayEpisode(
            replacement.id,
            Some(Duration::from_secs(60))
        )));
    }

    #[tokio::test]
    async fn rejected_stop_is_reported_as_stop_failure() {
        let library = FakeLibrary::new();
        let stored = library.insert(episode("Show", "S01E01.mkv", 1, 1));
        let host = FakeHost::new("den", &library)
            .playing(2, &stored, Duration::from_secs(5))
            .with_failures(Failures {
                stop: true,
                ..Failures::default()
            });

        let failures = hold(&[(&host as &dyn MediaHost, vec![stored.file.clone()])]).await;
        assert!(matches!(
            failures.as_slice(),
            [SoftFailure::PlaybackStopFailed { host, .. }] if host == "den"
        ));
        assert!(host.is_playing());
    }

    #[tokio::test]
    async fn resume_failure_is_soft() {
        let token = ResumeToken {
            episode: None,
            file: "/mnt/tv/Show/S01E01.mkv".to_string(),
            position: Duration::from_secs(1),
        };
        let host = FakeHost::new("den", &FakeLibrary::new());
        assert!(matches!(
            resume(&host, &token, &[]).await,
            Some(SoftFailure::PlaybackResumeFailed { .. })
        ));
    }
}
