//! Capture and reapply of per-library episode fields around destructive operations.

use relayarr_player_core::{EpisodeDetails, MediaHost};
use tracing::{debug, info, warn};

use crate::outcome::SoftFailure;

/// Read the library entries stored for each host-side file.
///
/// Lookup failures are recorded and the file is skipped.
pub async fn capture(
    host: &dyn MediaHost,
    files: &[String],
) -> (Vec<EpisodeDetails>, Vec<SoftFailure>) {
    let mut captured = Vec::new();
    let mut failures = Vec::new();
    for file in files {
        match host.episodes_by_file(file).await {
            Ok(episodes) => {
                debug!(
                    host = %host.name(),
                    file = %file,
                    entries = episodes.len(),
                    "captured metadata"
                );
                captured.extend(episodes);
            }
            Err(err) => {
                warn!(host = %host.name(), file = %file, error = %err, "metadata capture failed");
                failures.push(SoftFailure::MetadataCaptureFailed {
                    host: host.name().to_string(),
                    path: file.clone(),
                });
            }
        }
    }
    (captured, failures)
}

/// Write captured fields onto the entries describing the same episode.
///
/// Entries whose fields already match are left alone.
pub async fn reapply(
    host: &dyn MediaHost,
    captured: &[EpisodeDetails],
    current: &[EpisodeDetails],
) -> Vec<SoftFailure> {
    let mut failures = Vec::new();
    let mut applied = 0_usize;
    for old in captured {
        for new in current.iter().filter(|new| new.same_episode(old)) {
            if new.metadata == old.metadata {
                continue;
            }
            match host.set_episode_metadata(new.id, &old.metadata).await {
                Ok(()) => applied += 1,
                Err(err) => {
                    warn!(
                        host = %host.name(),
                        episode = %new,
                        error = %err,
                        "metadata reapply failed"
                    );
                    failures.push(SoftFailure::MetadataReapplyFailed {
                        host: host.name().to_string(),
                        episode: new.to_string(),
                    });
                }
            }
        }
    }
    if applied > 0 {
        info!(host = %host.name(), episodes = applied, "restored library metadata");
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayarr_test_support::fixtures::{episode, watched};
    use relayarr_test_support::mocks::{Failures, FakeHost, FakeLibrary};

    #[tokio::test]
    async fn reapply_restores_captured_fields_on_replacement() -> anyhow::Result<()> {
        let library = FakeLibrary::new();
        let old = library.insert(EpisodeDetails {
            metadata: watched("2023-05-01 08:00:00", 3)?,
            ..episode("Show", "S01E01.mkv", 1, 1)
        });
        let host = FakeHost::new("den", &library);

        let (captured, failures) = capture(&host, &[old.file.clone()]).await;
        assert!(failures.is_empty());
        host.remove_episode(old.id).await?;
        let replacement = library.insert(episode("Show", "S01E01.1080p.mkv", 1, 1));

        assert!(reapply(&host, &captured, &[replacement.clone()]).await.is_empty());
        let restored = library
            .by_file(&replacement.file)
            .ok_or_else(|| anyhow::anyhow!("replacement missing"))?;
        assert_eq!(restored.metadata, old.metadata);
        Ok(())
    }

    #[tokio::test]
    async fn capture_failure_is_soft() {
        let host = FakeHost::new("den", &FakeLibrary::new()).with_failures(Failures {
            lookup: true,
            ..Failures::default()
        });
        let (captured, failures) = capture(&host, &["/mnt/tv/Show/S01E01.mkv".to_string()]).await;
        assert!(captured.is_empty());
        assert!(matches!(
            failures.as_slice(),
            [SoftFailure::MetadataCaptureFailed { .. }]
        ));
    }

    #[tokio::test]
    async fn unrelated_entries_are_not_touched() -> anyhow::Result<()> {
        let library = FakeLibrary::new();
        let old = EpisodeDetails {
            metadata: watched("2023-05-01 08:00:00", 1)?,
            ..episode("Show", "S01E01.mkv", 1, 1)
        };
        let other = library.insert(episode("Show", "S01E02.mkv", 1, 2));
        let host = FakeHost::new("den", &library);

        assert!(reapply(&host, &[old], &[other]).await.is_empty());
        assert!(host.mutating_calls().is_empty());
        Ok(())
    }
}
