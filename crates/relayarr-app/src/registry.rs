//! Configured media hosts and their live state.
//!
//! # Design
//! - The registry is an immutable snapshot built once per process from the configuration.
//! - Candidates are the enabled hosts ordered by priority; equal priorities keep config order.
//! - Probing never fails: any transport or protocol error marks the host unreachable.

use std::sync::Arc;

use futures_util::future::join_all;
use relayarr_config::{HostConfig, RelayConfig};
use relayarr_kodi::KodiClient;
use relayarr_player_core::{MediaHost, Platform};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::playback::matches_target;

/// One configured host with its client.
#[derive(Clone)]
pub struct RegisteredHost {
    /// Host configuration.
    pub config: HostConfig,
    /// Client used for every remote call.
    pub client: Arc<dyn MediaHost>,
}

impl RegisteredHost {
    /// Pair a configuration with a client.
    #[must_use]
    pub fn new(config: HostConfig, client: Arc<dyn MediaHost>) -> Self {
        Self { config, client }
    }

    /// Configured host name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

impl std::fmt::Debug for RegisteredHost {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RegisteredHost")
            .field("name", &self.config.name)
            .field("priority", &self.config.priority)
            .finish_non_exhaustive()
    }
}

/// Live state of a host, recomputed for every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostState {
    /// Host answered the probe.
    pub reachable: bool,
    /// A video player is active.
    pub is_playing: bool,
    /// File loaded in the active video player.
    pub active_item_path: Option<String>,
    /// Reported operating system.
    pub platform: Platform,
}

impl HostState {
    /// State of a host that did not answer.
    #[must_use]
    pub const fn unreachable() -> Self {
        Self {
            reachable: false,
            is_playing: false,
            active_item_path: None,
            platform: Platform::Unknown,
        }
    }

    /// Whether the probe saw a video playing one of `targets`.
    ///
    /// A playing host whose item could not be read counts as a match.
    #[must_use]
    pub fn is_playing_any(&self, targets: &[String]) -> bool {
        self.is_playing
            && !targets.is_empty()
            && self
                .active_item_path
                .as_deref()
                .is_none_or(|file| matches_target(file, targets))
    }
}

/// A candidate host together with its probed state.
#[derive(Debug, Clone)]
pub struct ProbedHost<'a> {
    /// The configured host.
    pub host: &'a RegisteredHost,
    /// State observed by the probe.
    pub state: HostState,
}

impl ProbedHost<'_> {
    /// Configured host name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.host.name()
    }

    /// Client for remote calls.
    #[must_use]
    pub fn client(&self) -> &dyn MediaHost {
        self.host.client.as_ref()
    }
}

/// Immutable snapshot of the host pool.
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: Vec<RegisteredHost>,
}

impl HostRegistry {
    /// Registry over prebuilt hosts.
    #[must_use]
    pub const fn new(hosts: Vec<RegisteredHost>) -> Self {
        Self { hosts }
    }

    /// Build Kodi clients for every configured host.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::HostClient`] if a client cannot be constructed.
    pub fn from_config(config: &RelayConfig) -> AppResult<Self> {
        let hosts = config
            .hosts
            .iter()
            .map(|host| {
                let client = KodiClient::from_config(host, &config.timeouts).map_err(|source| {
                    AppError::HostClient {
                        host: host.name.clone(),
                        source,
                    }
                })?;
                Ok(RegisteredHost::new(host.clone(), Arc::new(client)))
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self::new(hosts))
    }

    /// Enabled hosts, most preferred first.
    #[must_use]
    pub fn candidates(&self) -> Vec<&RegisteredHost> {
        let mut candidates: Vec<&RegisteredHost> = self
            .hosts
            .iter()
            .filter(|host| {
                if !host.config.enabled {
                    debug!(host = %host.name(), "skipping disabled host");
                }
                host.config.enabled
            })
            .collect();
        candidates.sort_by_key(|host| host.config.priority);
        candidates
    }

    /// Probe one host.
    pub async fn probe(host: &RegisteredHost) -> HostState {
        let client = host.client.as_ref();
        if let Err(err) = client.ping().await {
            warn!(host = %host.name(), error = %err, "host did not answer probe");
            return HostState::unreachable();
        }

        let platform = client.platform().await.unwrap_or_else(|err| {
            debug!(host = %host.name(), error = %err, "platform unknown");
            Platform::Unknown
        });

        let mut state = HostState {
            reachable: true,
            is_playing: false,
            active_item_path: None,
            platform,
        };
        match client.active_players().await {
            Ok(players) => {
                if let Some(player) = players.iter().find(|player| player.is_video()) {
                    state.is_playing = true;
                    state.active_item_path = client
                        .player_item(player.id)
                        .await
                        .ok()
                        .flatten()
                        .and_then(|item| item.file);
                }
            }
            Err(err) => debug!(host = %host.name(), error = %err, "player state unknown"),
        }
        debug!(
            host = %host.name(),
            platform = ?state.platform,
            playing = state.is_playing,
            "probed host"
        );
        state
    }

    /// Probe every candidate concurrently, preserving candidate order.
    pub async fn probe_all(&self) -> Vec<ProbedHost<'_>> {
        let candidates = self.candidates();
        let states = join_all(candidates.iter().map(|host| Self::probe(host))).await;
        candidates
            .into_iter()
            .zip(states)
            .map(|(host, state)| ProbedHost { host, state })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayarr_test_support::fixtures::{episode, host_config};
    use relayarr_test_support::mocks::{FakeHost, FakeLibrary};
    use std::time::Duration;

    fn registered(config: HostConfig, host: FakeHost) -> RegisteredHost {
        RegisteredHost::new(config, Arc::new(host))
    }

    #[test]
    fn candidates_sort_by_priority_and_drop_disabled() {
        let library = FakeLibrary::new();
        let mut disabled = host_config("attic", 0);
        disabled.enabled = false;
        let registry = HostRegistry::new(vec![
            registered(host_config("den", 2), FakeHost::new("den", &library)),
            registered(disabled, FakeHost::new("attic", &library)),
            registered(host_config("kitchen", 1), FakeHost::new("kitchen", &library)),
            registered(host_config("bedroom", 2), FakeHost::new("bedroom", &library)),
        ]);
        let names: Vec<&str> = registry
            .candidates()
            .into_iter()
            .map(RegisteredHost::name)
            .collect();
        assert_eq!(names, vec!["kitchen", "den", "bedroom"]);
    }

    #[tokio::test]
    async fn probe_reports_playing_item() {
        let library = FakeLibrary::new();
        let stored = library.insert(episode("Show", "S01E01.mkv", 1, 1));
        let host = registered(
            host_config("den", 0),
            FakeHost::new("den", &library).playing(1, &stored, Duration::from_secs(30)),
        );
        let state = HostRegistry::probe(&host).await;
        assert!(state.reachable);
        assert!(state.is_playing);
        assert_eq!(state.active_item_path.as_deref(), Some(stored.file.as_str()));
        assert_eq!(state.platform, Platform::Linux);
    }

    #[test]
    fn playing_match_uses_probed_item() {
        let file = "/mnt/tv/Show/S01E01.mkv".to_string();
        let mut state = HostState {
            reachable: true,
            is_playing: true,
            active_item_path: Some(file.clone()),
            platform: Platform::Linux,
        };
        assert!(state.is_playing_any(std::slice::from_ref(&file)));
        assert!(state.is_playing_any(&["/mnt/tv/Show/".to_string()]));
        assert!(!state.is_playing_any(&["/mnt/tv/Other/S01E01.mkv".to_string()]));
        assert!(!state.is_playing_any(&[]));

        state.active_item_path = None;
        assert!(state.is_playing_any(&["/mnt/tv/Other/".to_string()]));

        state.is_playing = false;
        assert!(!state.is_playing_any(&[file]));
    }

    #[tokio::test]
    async fn unreachable_host_fails_soft() {
        let host = registered(
            host_config("gone", 0),
            FakeHost::new("gone", &FakeLibrary::new()).unreachable(),
        );
        assert_eq!(HostRegistry::probe(&host).await, HostState::unreachable());
    }

    #[tokio::test]
    async fn probe_all_keeps_candidate_order() {
        let library = FakeLibrary::new();
        let registry = HostRegistry::new(vec![
            registered(
                host_config("b", 2),
                FakeHost::new("b", &library).unreachable(),
            ),
            registered(host_config("a", 1), FakeHost::new("a", &library)),
        ]);
        let probed = registry.probe_all().await;
        let summary: Vec<(&str, bool)> = probed
            .iter()
            .map(|probed| (probed.name(), probed.state.reachable))
            .collect();
        assert_eq!(summary, vec![("a", true), ("b", false)]);
    }
}
