//! Remote-call contract implemented by media host adapters.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::HostResult;
use crate::model::{
    ActivePlayer, EpisodeDetails, EpisodeId, ItemMetadata, Notification, Platform,
    PlaybackPosition, PlayerId, PlayerItem, ShowDetails, ShowId,
};

/// Remote operations the relay issues against a single media host.
///
/// All paths are host-side paths; translation from the media manager's view happens before
/// the call. Implementations must not retry internally, callers own retry and timeout policy.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Host name used in logs.
    fn name(&self) -> &str;

    /// Cheap liveness check.
    async fn ping(&self) -> HostResult<()>;

    /// Operating system the host runs on.
    async fn platform(&self) -> HostResult<Platform>;

    /// Whether a library scan or clean is in progress.
    async fn is_scanning(&self) -> HostResult<bool>;

    /// Start a library scan, limited to `directory` when given. Returns once the scan is
    /// accepted; completion is observed through [`MediaHost::is_scanning`].
    async fn scan(&self, directory: Option<&str>) -> HostResult<()>;

    /// Clean TV content from the library. May block until the clean completes.
    async fn clean(&self) -> HostResult<()>;

    /// Episodes stored for the given file.
    async fn episodes_by_file(&self, file: &str) -> HostResult<Vec<EpisodeDetails>>;

    /// Episodes whose path lies under `directory`.
    async fn episodes_in_directory(&self, directory: &str) -> HostResult<Vec<EpisodeDetails>>;

    /// A single episode by library id.
    async fn episode(&self, id: EpisodeId) -> HostResult<EpisodeDetails>;

    /// Shows whose path lies under `directory`.
    async fn shows_in_directory(&self, directory: &str) -> HostResult<Vec<ShowDetails>>;

    /// Remove an episode from the library.
    async fn remove_episode(&self, id: EpisodeId) -> HostResult<()>;

    /// Remove a show and its episodes from the library.
    async fn remove_show(&self, id: ShowId) -> HostResult<()>;

    /// Overwrite the mutable per-library fields of an episode.
    async fn set_episode_metadata(&self, id: EpisodeId, metadata: &ItemMetadata)
    -> HostResult<()>;

    /// Players currently active.
    async fn active_players(&self) -> HostResult<Vec<ActivePlayer>>;

    /// Item loaded in the given player, if any.
    async fn player_item(&self, player: PlayerId) -> HostResult<Option<PlayerItem>>;

    /// Current position of the given player.
    async fn player_position(&self, player: PlayerId) -> HostResult<PlaybackPosition>;

    /// Stop the given player.
    async fn stop(&self, player: PlayerId) -> HostResult<()>;

    /// Start playing an episode, resuming at `resume_at` when given.
    async fn play_episode(&self, id: EpisodeId, resume_at: Option<Duration>) -> HostResult<()>;

    /// Show an on-screen notification.
    async fn notify(&self, notification: &Notification) -> HostResult<()>;
}
