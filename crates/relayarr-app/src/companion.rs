//! Companion files (`.nfo`) written next to imported media by the media manager.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::polling::{Backoff, PollOutcome, poll_until};

/// Existence checks on the filesystem the media manager writes to.
#[async_trait]
pub trait CompanionFiles: Send + Sync {
    /// Whether `path` exists.
    async fn exists(&self, path: &str) -> bool;
}

/// [`CompanionFiles`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

#[async_trait]
impl CompanionFiles for LocalFilesystem {
    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

/// `.nfo` sibling of a media file.
#[must_use]
pub fn episode_nfo(media_file: &str) -> String {
    Path::new(media_file)
        .with_extension("nfo")
        .to_string_lossy()
        .into_owned()
}

/// `tvshow.nfo` inside a series directory.
#[must_use]
pub fn show_nfo(series_dir: &str) -> String {
    Path::new(series_dir)
        .join("tvshow.nfo")
        .to_string_lossy()
        .into_owned()
}

/// Wait until every path exists or `budget` elapses.
///
/// Returns the paths still missing; an empty list means all appeared.
pub async fn wait_for_files(
    files: &dyn CompanionFiles,
    paths: &[String],
    budget: Duration,
) -> Vec<String> {
    if paths.is_empty() {
        return Vec::new();
    }
    info!(
        files = paths.len(),
        budget_secs = budget.as_secs(),
        "waiting for companion files"
    );

    let found = tokio::sync::Mutex::new(BTreeSet::new());
    let found_ref = &found;
    let outcome = poll_until(budget, Backoff::FILES, move || async move {
        let mut found = found_ref.lock().await;
        for path in paths {
            if !found.contains(path) && files.exists(path).await {
                debug!(path = %path, "companion file present");
                found.insert(path.clone());
            }
        }
        found.len() == paths.len()
    })
    .await;

    if outcome == PollOutcome::Ready {
        return Vec::new();
    }
    let found = found.into_inner();
    let missing: Vec<String> = paths
        .iter()
        .filter(|path| !found.contains(*path))
        .cloned()
        .collect();
    warn!(missing = %missing.join(", "), "companion files did not appear in time");
    missing
}
