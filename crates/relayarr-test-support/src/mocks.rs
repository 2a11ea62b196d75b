//! Scriptable in-memory media host.
//!
//! # Design
//! - Hosts built over the same [`FakeLibrary`] share one library, like players sharing one
//!   database.
//! - Every call is recorded before reachability and scripted failures are applied.
//! - Scans import staged episodes under the scanned directory; cleans drop entries marked missing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use relayarr_player_core::{
    ActivePlayer, EpisodeDetails, EpisodeId, HostError, HostResult, ItemMetadata, MediaHost,
    Notification, Platform, PlaybackPosition, PlayerId, PlayerItem, ShowDetails, ShowId,
};

/// Library shared by one or more fake hosts.
#[derive(Debug, Clone, Default)]
pub struct FakeLibrary {
    inner: Arc<Mutex<LibraryState>>,
}

#[derive(Debug, Default)]
struct LibraryState {
    episodes: BTreeMap<EpisodeId, EpisodeDetails>,
    shows: BTreeMap<ShowId, ShowDetails>,
    staged: Vec<EpisodeDetails>,
    missing: BTreeSet<String>,
    next_id: i64,
}

impl LibraryState {
    const fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn show_for(&mut self, episode: &EpisodeDetails) -> ShowId {
        if let Some(show) = self
            .shows
            .values()
            .find(|show| show.title == episode.show_title)
        {
            return show.id;
        }
        let id = self.allocate();
        let directory = episode
            .file
            .rfind(['/', '\\'])
            .map_or_else(String::new, |index| episode.file[..=index].to_string());
        self.shows.insert(
            id,
            ShowDetails {
                id,
                title: episode.show_title.clone(),
                file: directory,
                year: None,
            },
        );
        id
    }

    fn insert(&mut self, mut episode: EpisodeDetails) -> EpisodeDetails {
        episode.id = self.allocate();
        episode.show_id = self.show_for(&episode);
        self.episodes.insert(episode.id, episode.clone());
        episode
    }

    fn import(&mut self, directory: Option<&str>) {
        let (covered, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.staged)
            .into_iter()
            .partition(|episode| directory.is_none_or(|dir| episode.file.starts_with(dir)));
        self.staged = pending;
        for episode in covered {
            self.insert(episode);
        }
    }

    fn clean(&mut self) {
        let missing = std::mem::take(&mut self.missing);
        self.episodes
            .retain(|_, episode| !missing.contains(&episode.file));
        let shows_with_episodes: BTreeSet<ShowId> =
            self.episodes.values().map(|episode| episode.show_id).collect();
        self.shows
            .retain(|id, show| shows_with_episodes.contains(id) || !missing.contains(&show.file));
    }
}

impl FakeLibrary {
    /// Empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LibraryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an episode (creating its show on first use) and return it with ids assigned.
    pub fn insert(&self, episode: EpisodeDetails) -> EpisodeDetails {
        self.lock().insert(episode)
    }

    /// Store a show with no episodes.
    pub fn insert_show(&self, title: &str, directory: &str, year: Option<i32>) -> ShowId {
        let mut state = self.lock();
        let id = state.allocate();
        state.shows.insert(
            id,
            ShowDetails {
                id,
                title: title.to_string(),
                file: directory.to_string(),
                year,
            },
        );
        id
    }

    /// Put an episode on disk; the next scan covering its path imports it.
    pub fn stage(&self, episode: EpisodeDetails) {
        self.lock().staged.push(episode);
    }

    /// Mark a file as gone from disk; the next clean drops its entries.
    pub fn mark_missing(&self, file: &str) {
        self.lock().missing.insert(file.to_string());
    }

    /// Every stored episode, ordered by id.
    #[must_use]
    pub fn episodes(&self) -> Vec<EpisodeDetails> {
        self.lock().episodes.values().cloned().collect()
    }

    /// Every stored show, ordered by id.
    #[must_use]
    pub fn shows(&self) -> Vec<ShowDetails> {
        self.lock().shows.values().cloned().collect()
    }

    /// Stored episode at `file`, if any.
    #[must_use]
    pub fn by_file(&self, file: &str) -> Option<EpisodeDetails> {
        self.lock()
            .episodes
            .values()
            .find(|episode| episode.file == file)
            .cloned()
    }
}

/// One recorded call against a [`FakeHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// `ping`
    Ping,
    /// `platform`
    Platform,
    /// `is_scanning`
    IsScanning,
    /// `scan`, with the directory when scoped.
    Scan(Option<String>),
    /// `clean`
    Clean,
    /// `episodes_by_file`
    EpisodesByFile(String),
    /// `episodes_in_directory`
    EpisodesInDirectory(String),
    /// `episode`
    Episode(EpisodeId),
    /// `shows_in_directory`
    ShowsInDirectory(String),
    /// `remove_episode`
    RemoveEpisode(EpisodeId),
    /// `remove_show`
    RemoveShow(ShowId),
    /// `set_episode_metadata`
    SetEpisodeMetadata(EpisodeId, ItemMetadata),
    /// `active_players`
    ActivePlayers,
    /// `player_item`
    PlayerItem(PlayerId),
    /// `player_position`
    PlayerPosition(PlayerId),
    /// `stop`
    Stop(PlayerId),
    /// `play_episode`
    PlayEpisode(EpisodeId, Option<Duration>),
    /// `notify`
    Notify(Notification),
}

impl HostCall {
    /// Whether the call changes library, player or GUI state.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Scan(_)
                | Self::Clean
                | Self::RemoveEpisode(_)
                | Self::RemoveShow(_)
                | Self::SetEpisodeMetadata(..)
                | Self::Stop(_)
                | Self::PlayEpisode(..)
                | Self::Notify(_)
        )
    }
}

/// Calls that fail with an RPC error.
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Failures {
    /// Every scan, scoped or full.
    pub scan: bool,
    /// Directory-scoped scans only.
    pub directory_scan: bool,
    /// `clean`
    pub clean: bool,
    /// `episodes_by_file`
    pub lookup: bool,
    /// `remove_episode` and `remove_show`
    pub remove: bool,
    /// `set_episode_metadata`
    pub set_metadata: bool,
    /// `stop`
    pub stop: bool,
    /// `play_episode`
    pub play: bool,
    /// `notify`
    pub notify: bool,
}

#[derive(Debug, Clone)]
struct FakePlayer {
    id: PlayerId,
    item: PlayerItem,
    position: PlaybackPosition,
}

#[derive(Debug)]
struct HostState {
    reachable: bool,
    platform: Platform,
    failures: Failures,
    players: Vec<FakePlayer>,
    idle_after_polls: Option<u32>,
    scan_polls: u32,
    scanning_remaining: u32,
    scan_never_finishes: bool,
    calls: Vec<HostCall>,
}

/// In-memory [`MediaHost`] with scripted behaviour.
#[derive(Debug)]
pub struct FakeHost {
    name: String,
    library: FakeLibrary,
    state: Mutex<HostState>,
}

impl FakeHost {
    /// Reachable Linux host over `library` whose scans finish after one busy poll.
    #[must_use]
    pub fn new(name: &str, library: &FakeLibrary) -> Self {
        Self {
            name: name.to_string(),
            library: library.clone(),
            state: Mutex::new(HostState {
                reachable: true,
                platform: Platform::Linux,
                failures: Failures::default(),
                players: Vec::new(),
                idle_after_polls: None,
                scan_polls: 1,
                scanning_remaining: 0,
                scan_never_finishes: false,
                calls: Vec::new(),
            }),
        }
    }

    fn edit(mut self, apply: impl FnOnce(&mut HostState)) -> Self {
        apply(self.state.get_mut().unwrap_or_else(PoisonError::into_inner));
        self
    }

    /// Every call fails as a refused connection.
    #[must_use]
    pub fn unreachable(self) -> Self {
        self.edit(|state| state.reachable = false)
    }

    /// Report `platform` instead of Linux.
    #[must_use]
    pub fn with_platform(self, platform: Platform) -> Self {
        self.edit(|state| state.platform = platform)
    }

    /// Fail the selected calls.
    #[must_use]
    pub fn with_failures(self, failures: Failures) -> Self {
        self.edit(|state| state.failures = failures)
    }

    /// `is_scanning` stays true forever after a scan.
    #[must_use]
    pub fn scan_never_finishes(self) -> Self {
        self.edit(|state| state.scan_never_finishes = true)
    }

    /// Start a video player showing `episode` at `elapsed`.
    #[must_use]
    pub fn playing(self, player: PlayerId, episode: &EpisodeDetails, elapsed: Duration) -> Self {
        let fake = FakePlayer {
            id: player,
            item: episode_item(episode),
            position: PlaybackPosition {
                elapsed,
                percentage: 25.0,
            },
        };
        self.edit(|state| state.players.push(fake))
    }

    /// Players stop on their own after `polls` calls to `active_players`.
    #[must_use]
    pub fn idle_after_polls(self, polls: u32) -> Self {
        self.edit(|state| state.idle_after_polls = Some(polls))
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(
        &self,
        operation: &'static str,
        call: HostCall,
    ) -> HostResult<MutexGuard<'_, HostState>> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.reachable {
            Ok(state)
        } else {
            Err(HostError::Unreachable {
                operation,
                detail: "connection refused".to_string(),
            })
        }
    }

    /// Like [`Self::begin`] for calls that need no host state.
    fn record(&self, operation: &'static str, call: HostCall) -> HostResult<()> {
        self.begin(operation, call).map(drop)
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().calls.clone()
    }

    /// Calls that changed library, player or GUI state.
    #[must_use]
    pub fn mutating_calls(&self) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(HostCall::is_mutating)
            .collect()
    }

    /// Notifications received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Notify(notification) => Some(notification),
                _ => None,
            })
            .collect()
    }

    /// Scoped and full scans received so far.
    #[must_use]
    pub fn scans(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Scan(directory) => Some(directory),
                _ => None,
            })
            .collect()
    }

    /// Whether any player is active.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        !self.lock().players.is_empty()
    }
}

fn episode_item(episode: &EpisodeDetails) -> PlayerItem {
    PlayerItem {
        id: Some(episode.id),
        label: episode.to_string(),
        kind: "episode".to_string(),
        file: Some(episode.file.clone()),
    }
}

fn scripted(operation: &'static str) -> HostError {
    HostError::Rpc {
        operation,
        code: -32100,
        message: "scripted failure".to_string(),
    }
}

fn invalid_params(operation: &'static str) -> HostError {
    HostError::Rpc {
        operation,
        code: -32602,
        message: "Invalid params.".to_string(),
    }
}

#[async_trait]
impl MediaHost for FakeHost {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> HostResult<()> {
        self.record("ping", HostCall::Ping)
    }

    async fn platform(&self) -> HostResult<Platform> {
        Ok(self.begin("platform", HostCall::Platform)?.platform)
    }

    async fn is_scanning(&self) -> HostResult<bool> {
        let mut state = self.begin("is_scanning", HostCall::IsScanning)?;
        if state.scan_never_finishes {
            return Ok(true);
        }
        if state.scanning_remaining > 0 {
            state.scanning_remaining -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    async fn scan(&self, directory: Option<&str>) -> HostResult<()> {
        let mut state = self.begin("scan", HostCall::Scan(directory.map(str::to_string)))?;
        if state.failures.scan || (directory.is_some() && state.failures.directory_scan) {
            return Err(scripted("scan"));
        }
        self.library.lock().import(directory);
        state.scanning_remaining = state.scan_polls;
        Ok(())
    }

    async fn clean(&self) -> HostResult<()> {
        let mut state = self.begin("clean", HostCall::Clean)?;
        if state.failures.clean {
            return Err(scripted("clean"));
        }
        self.library.lock().clean();
        state.scanning_remaining = state.scan_polls;
        Ok(())
    }

    async fn episodes_by_file(&self, file: &str) -> HostResult<Vec<EpisodeDetails>> {
        let failures = self
            .begin("episodes_by_file", HostCall::EpisodesByFile(file.to_string()))?
            .failures;
        if failures.lookup {
            return Err(scripted("episodes_by_file"));
        }
        Ok(self
            .library
            .lock()
            .episodes
            .values()
            .filter(|episode| episode.file == file)
            .cloned()
            .collect())
    }

    async fn episodes_in_directory(&self, directory: &str) -> HostResult<Vec<EpisodeDetails>> {
        self.record(
            "episodes_in_directory",
            HostCall::EpisodesInDirectory(directory.to_string()),
        )?;
        Ok(self
            .library
            .lock()
            .episodes
            .values()
            .filter(|episode| episode.file.starts_with(directory))
            .cloned()
            .collect())
    }

    async fn episode(&self, id: EpisodeId) -> HostResult<EpisodeDetails> {
        self.record("episode", HostCall::Episode(id))?;
        self.library
            .lock()
            .episodes
            .get(&id)
            .cloned()
            .ok_or_else(|| invalid_params("episode"))
    }

    async fn shows_in_directory(&self, directory: &str) -> HostResult<Vec<ShowDetails>> {
        self.record(
            "shows_in_directory",
            HostCall::ShowsInDirectory(directory.to_string()),
        )?;
        Ok(self
            .library
            .lock()
            .shows
            .values()
            .filter(|show| show.file.starts_with(directory))
            .cloned()
            .collect())
    }

    async fn remove_episode(&self, id: EpisodeId) -> HostResult<()> {
        if self.begin("remove_episode", HostCall::RemoveEpisode(id))?.failures.remove {
            return Err(scripted("remove_episode"));
        }
        self.library
            .lock()
            .episodes
            .remove(&id)
            .map(drop)
            .ok_or_else(|| invalid_params("remove_episode"))
    }

    async fn remove_show(&self, id: ShowId) -> HostResult<()> {
        if self.begin("remove_show", HostCall::RemoveShow(id))?.failures.remove {
            return Err(scripted("remove_show"));
        }
        let mut library = self.library.lock();
        library.shows.remove(&id).ok_or_else(|| invalid_params("remove_show"))?;
        library.episodes.retain(|_, episode| episode.show_id != id);
        Ok(())
    }

    async fn set_episode_metadata(
        &self,
        id: EpisodeId,
        metadata: &ItemMetadata,
    ) -> HostResult<()> {
        let failures = self
            .begin(
                "set_episode_metadata",
                HostCall::SetEpisodeMetadata(id, metadata.clone()),
            )?
            .failures;
        if failures.set_metadata {
            return Err(scripted("set_episode_metadata"));
        }
        let mut library = self.library.lock();
        let episode = library
            .episodes
            .get_mut(&id)
            .ok_or_else(|| invalid_params("set_episode_metadata"))?;
        episode.metadata = metadata.clone();
        Ok(())
    }

    async fn active_players(&self) -> HostResult<Vec<ActivePlayer>> {
        let mut state = self.begin("active_players", HostCall::ActivePlayers)?;
        match state.idle_after_polls {
            Some(0) => {
                state.players.clear();
                state.idle_after_polls = None;
            }
            Some(polls) => state.idle_after_polls = Some(polls - 1),
            None => {}
        }
        Ok(state
            .players
            .iter()
            .map(|player| ActivePlayer {
                id: player.id,
                media_type: "video".to_string(),
            })
            .collect())
    }

    async fn player_item(&self, player: PlayerId) -> HostResult<Option<PlayerItem>> {
        let state = self.begin("player_item", HostCall::PlayerItem(player))?;
        Ok(state
            .players
            .iter()
            .find(|candidate| candidate.id == player)
            .map(|candidate| candidate.item.clone()))
    }

    async fn player_position(&self, player: PlayerId) -> HostResult<PlaybackPosition> {
        let state = self.begin("player_position", HostCall::PlayerPosition(player))?;
        state
            .players
            .iter()
            .find(|candidate| candidate.id == player)
            .map(|candidate| candidate.position)
            .ok_or_else(|| invalid_params("player_position"))
    }

    async fn stop(&self, player: PlayerId) -> HostResult<()> {
        let mut state = self.begin("stop", HostCall::Stop(player))?;
        if state.failures.stop {
            return Err(scripted("stop"));
        }
        let before = state.players.len();
        state.players.retain(|candidate| candidate.id != player);
        if state.players.len() == before {
            return Err(invalid_params("stop"));
        }
        Ok(())
    }

    async fn play_episode(&self, id: EpisodeId, resume_at: Option<Duration>) -> HostResult<()> {
        let mut state = self.begin("play_episode", HostCall::PlayEpisode(id, resume_at))?;
        if state.failures.play {
            return Err(scripted("play_episode"));
        }
        let episode = self
            .library
            .lock()
            .episodes
            .get(&id)
            .cloned()
            .ok_or_else(|| invalid_params("play_episode"))?;
        state.players.push(FakePlayer {
            id: 1,
            item: episode_item(&episode),
            position: PlaybackPosition {
                elapsed: resume_at.unwrap_or_default(),
                percentage: 0.0,
            },
        });
        Ok(())
    }

    async fn notify(&self, notification: &Notification) -> HostResult<()> {
        let failures = self
            .begin("notify", HostCall::Notify(notification.clone()))?
            .failures;
        if failures.notify {
            return Err(scripted("notify"));
        }
        Ok(())
    }
}
