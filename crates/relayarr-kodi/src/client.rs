//! HTTP transport and [`MediaHost`] implementation for Kodi.
//!
//! # Design
//! - One `POST /jsonrpc` per call, basic auth when configured, no internal retries.
//! - Each call picks its own timeout (probe, request, clean) so liveness checks stay short.
//! - Transport failures map onto `HostError` so callers never see reqwest types.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use relayarr_config::{HostConfig, TimeoutConfig};
use relayarr_player_core::{
    ActivePlayer, EpisodeDetails, EpisodeId, HostError, HostResult, ItemMetadata, MediaHost,
    Notification, Platform, PlaybackPosition, PlayerId, PlayerItem, ShowDetails, ShowId,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::error::{KodiError, KodiResult};
use crate::wire::{
    EPISODE_PROPERTIES, EpisodeDetailsResult, EpisodeList, PlayerItemResult, PlayerProperties,
    RpcRequest, RpcResponse, SHOW_PROPERTIES, ShowList, WirePlayer, WireTime, path_filter,
    set_episode_params, split_file_path,
};

const SCANNING_LABEL: &str = "Library.IsScanning";

/// Per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KodiTimeouts {
    /// Liveness and state probes.
    pub probe: Duration,
    /// Ordinary calls.
    pub request: Duration,
    /// `VideoLibrary.Clean`, which blocks until the clean finishes.
    pub clean: Duration,
}

impl From<&TimeoutConfig> for KodiTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            probe: config.probe(),
            request: config.request(),
            clean: config.clean(),
        }
    }
}

/// JSON-RPC client for one Kodi instance.
#[derive(Debug)]
pub struct KodiClient {
    name: String,
    endpoint: Url,
    credentials: Option<(String, Option<String>)>,
    timeouts: KodiTimeouts,
    http: Client,
    next_id: AtomicU64,
}

impl KodiClient {
    /// Build a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`KodiError::InvalidEndpoint`] for a malformed URL and
    /// [`KodiError::BuildClient`] when the HTTP client cannot be constructed.
    pub fn new(
        name: impl Into<String>,
        endpoint: &str,
        credentials: Option<(String, Option<String>)>,
        timeouts: KodiTimeouts,
    ) -> KodiResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|source| KodiError::InvalidEndpoint {
            value: endpoint.to_string(),
            source,
        })?;
        let http = Client::builder()
            .build()
            .map_err(|source| KodiError::BuildClient { source })?;
        Ok(Self {
            name: name.into(),
            endpoint,
            credentials,
            timeouts,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Build a client from a configured host.
    ///
    /// # Errors
    ///
    /// See [`KodiClient::new`].
    pub fn from_config(host: &HostConfig, timeouts: &TimeoutConfig) -> KodiResult<Self> {
        let credentials = host
            .credentials()
            .map(|(user, password)| (user.to_string(), password.map(str::to_string)));
        Self::new(
            host.name.clone(),
            &host.endpoint(),
            credentials,
            KodiTimeouts::from(timeouts),
        )
    }

    /// Issue one JSON-RPC call and decode its `result`.
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> HostResult<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(host = %self.name, method, id = request.id, "json-rpc call");

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .timeout(timeout)
            .json(&request);
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, password.as_deref());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| transport_error(operation, &err))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(host = %self.name, method, "credentials rejected");
            return Err(HostError::Unauthorized { operation });
        }
        if !status.is_success() {
            return Err(HostError::Http {
                operation,
                status: status.as_u16(),
            });
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|err| transport_error(operation, &err))?;
        if let Some(error) = envelope.error {
            return Err(HostError::Rpc {
                operation,
                code: error.code,
                message: error.message,
            });
        }
        let result = envelope.result.ok_or_else(|| HostError::InvalidResponse {
            operation,
            detail: "response carried neither result nor error".to_string(),
        })?;
        serde_json::from_value(result).map_err(|err| HostError::InvalidResponse {
            operation,
            detail: err.to_string(),
        })
    }

    /// Call a method whose success result is the string `OK`.
    async fn call_ok(
        &self,
        operation: &'static str,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> HostResult<()> {
        let result: String = self.call(operation, method, Some(params), timeout).await?;
        if result == "OK" {
            Ok(())
        } else {
            Err(HostError::InvalidResponse {
                operation,
                detail: format!("expected OK, got {result}"),
            })
        }
    }

    async fn info_booleans(
        &self,
        operation: &'static str,
        labels: &[&str],
    ) -> HostResult<HashMap<String, bool>> {
        self.call(
            operation,
            "XBMC.GetInfoBooleans",
            Some(json!({ "booleans": labels })),
            self.timeouts.probe,
        )
        .await
    }

    async fn episodes(
        &self,
        operation: &'static str,
        filter: Value,
    ) -> HostResult<Vec<EpisodeDetails>> {
        let list: EpisodeList = self
            .call(
                operation,
                "VideoLibrary.GetEpisodes",
                Some(json!({ "properties": EPISODE_PROPERTIES, "filter": filter })),
                self.timeouts.request,
            )
            .await?;
        Ok(list.episodes.into_iter().map(EpisodeDetails::from).collect())
    }
}

fn transport_error(operation: &'static str, err: &reqwest::Error) -> HostError {
    if err.is_timeout() {
        HostError::Timeout { operation }
    } else if err.is_decode() {
        HostError::InvalidResponse {
            operation,
            detail: err.to_string(),
        }
    } else {
        HostError::Unreachable {
            operation,
            detail: err.to_string(),
        }
    }
}

#[async_trait]
impl MediaHost for KodiClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> HostResult<()> {
        let reply: String = self
            .call("ping", "JSONRPC.Ping", None, self.timeouts.probe)
            .await?;
        if reply == "pong" {
            Ok(())
        } else {
            Err(HostError::InvalidResponse {
                operation: "ping",
                detail: format!("expected pong, got {reply}"),
            })
        }
    }

    async fn platform(&self) -> HostResult<Platform> {
        let labels = Platform::KNOWN.map(Platform::info_label);
        let flags = self.info_booleans("platform", &labels).await?;
        Ok(Platform::KNOWN
            .into_iter()
            .find(|platform| flags.get(platform.info_label()).copied().unwrap_or(false))
            .unwrap_or(Platform::Unknown))
    }

    async fn is_scanning(&self) -> HostResult<bool> {
        let flags = self.info_booleans("is_scanning", &[SCANNING_LABEL]).await?;
        flags
            .get(SCANNING_LABEL)
            .copied()
            .ok_or_else(|| HostError::InvalidResponse {
                operation: "is_scanning",
                detail: format!("{SCANNING_LABEL} missing from response"),
            })
    }

    async fn scan(&self, directory: Option<&str>) -> HostResult<()> {
        let params = directory.map_or_else(
            || json!({ "showdialogs": false }),
            |directory| json!({ "directory": directory, "showdialogs": false }),
        );
        self.call_ok("scan", "VideoLibrary.Scan", params, self.timeouts.request)
            .await
    }

    async fn clean(&self) -> HostResult<()> {
        self.call_ok(
            "clean",
            "VideoLibrary.Clean",
            json!({ "showdialogs": false, "content": "tvshows" }),
            self.timeouts.clean,
        )
        .await
    }

    async fn episodes_by_file(&self, file: &str) -> HostResult<Vec<EpisodeDetails>> {
        let (directory, name) = split_file_path(file);
        let filter = json!({
            "and": [
                path_filter(directory),
                { "operator": "is", "field": "filename", "value": name },
            ]
        });
        self.episodes("episodes_by_file", filter).await
    }

    async fn episodes_in_directory(&self, directory: &str) -> HostResult<Vec<EpisodeDetails>> {
        self.episodes("episodes_in_directory", path_filter(directory))
            .await
    }

    async fn episode(&self, id: EpisodeId) -> HostResult<EpisodeDetails> {
        let details: EpisodeDetailsResult = self
            .call(
                "episode",
                "VideoLibrary.GetEpisodeDetails",
                Some(json!({ "episodeid": id, "properties": EPISODE_PROPERTIES })),
                self.timeouts.request,
            )
            .await?;
        Ok(details.episode.into())
    }

    async fn shows_in_directory(&self, directory: &str) -> HostResult<Vec<ShowDetails>> {
        let list: ShowList = self
            .call(
                "shows_in_directory",
                "VideoLibrary.GetTVShows",
                Some(json!({ "properties": SHOW_PROPERTIES, "filter": path_filter(directory) })),
                self.timeouts.request,
            )
            .await?;
        Ok(list.tvshows.into_iter().map(ShowDetails::from).collect())
    }

    async fn remove_episode(&self, id: EpisodeId) -> HostResult<()> {
        self.call_ok(
            "remove_episode",
            "VideoLibrary.RemoveEpisode",
            json!({ "episodeid": id }),
            self.timeouts.request,
        )
        .await
    }

    async fn remove_show(&self, id: ShowId) -> HostResult<()> {
        self.call_ok(
            "remove_show",
            "VideoLibrary.RemoveTVShow",
            json!({ "tvshowid": id }),
            self.timeouts.request,
        )
        .await
    }

    async fn set_episode_metadata(
        &self,
        id: EpisodeId,
        metadata: &ItemMetadata,
    ) -> HostResult<()> {
        self.call_ok(
            "set_episode_metadata",
            "VideoLibrary.SetEpisodeDetails",
            set_episode_params(id, metadata),
            self.timeouts.request,
        )
        .await
    }

    async fn active_players(&self) -> HostResult<Vec<ActivePlayer>> {
        let players: Vec<WirePlayer> = self
            .call(
                "active_players",
                "Player.GetActivePlayers",
                None,
                self.timeouts.probe,
            )
            .await?;
        Ok(players.into_iter().map(ActivePlayer::from).collect())
    }

    async fn player_item(&self, player: PlayerId) -> HostResult<Option<PlayerItem>> {
        let result: PlayerItemResult = self
            .call(
                "player_item",
                "Player.GetItem",
                Some(json!({ "playerid": player, "properties": ["file"] })),
                self.timeouts.probe,
            )
            .await?;
        Ok(result.item.into_item())
    }

    async fn player_position(&self, player: PlayerId) -> HostResult<PlaybackPosition> {
        let properties: PlayerProperties = self
            .call(
                "player_position",
                "Player.GetProperties",
                Some(json!({ "playerid": player, "properties": ["time", "percentage"] })),
                self.timeouts.probe,
            )
            .await?;
        Ok(properties.into())
    }

    async fn stop(&self, player: PlayerId) -> HostResult<()> {
        self.call_ok(
            "stop",
            "Player.Stop",
            json!({ "playerid": player }),
            self.timeouts.request,
        )
        .await
    }

    async fn play_episode(&self, id: EpisodeId, resume_at: Option<Duration>) -> HostResult<()> {
        let resume = resume_at.map_or(Value::Bool(false), |position| {
            json!(WireTime::from_duration(position))
        });
        self.call_ok(
            "play_episode",
            "Player.Open",
            json!({ "item": { "episodeid": id }, "options": { "resume": resume } }),
            self.timeouts.request,
        )
        .await
    }

    async fn notify(&self, notification: &Notification) -> HostResult<()> {
        let display_ms = u64::try_from(notification.display_time.as_millis()).unwrap_or(u64::MAX);
        self.call_ok(
            "notify",
            "GUI.ShowNotification",
            json!({
                "title": notification.title,
                "message": notification.message,
                "displaytime": display_ms,
                "image": notification.image,
            }),
            self.timeouts.request,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;

    fn timeouts() -> KodiTimeouts {
        KodiTimeouts {
            probe: Duration::from_millis(300),
            request: Duration::from_secs(2),
            clean: Duration::from_secs(2),
        }
    }

    fn client_for(server: &MockServer) -> Result<KodiClient> {
        Ok(KodiClient::new(
            "den",
            &server.url("/jsonrpc"),
            Some(("kodi".to_string(), Some("kodi".to_string()))),
            timeouts(),
        )?)
    }

    fn rpc_result(result: &Value) -> Value {
        json!({ "id": 1, "jsonrpc": "2.0", "result": result })
    }

    #[tokio::test]
    async fn ping_sends_basic_auth_and_accepts_pong() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/jsonrpc")
                .header("authorization", "Basic a29kaTprb2Rp")
                .body_includes("\"method\":\"JSONRPC.Ping\"");
            then.status(200).json_body(rpc_result(&json!("pong")));
        });

        client_for(&server)?.ping().await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn unauthorized_status_is_mapped() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc");
            then.status(401);
        });

        let err = client_for(&server)?.ping().await.err();
        assert_eq!(err, Some(HostError::Unauthorized { operation: "ping" }));
        Ok(())
    }

    #[tokio::test]
    async fn slow_host_times_out_on_probe() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(rpc_result(&json!("pong")));
        });

        let err = client_for(&server)?.ping().await.err();
        assert_eq!(err, Some(HostError::Timeout { operation: "ping" }));
        Ok(())
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() -> Result<()> {
        let client = KodiClient::new("gone", "http://127.0.0.1:1/jsonrpc", None, timeouts())?;
        assert!(matches!(
            client.ping().await,
            Err(HostError::Unreachable { operation: "ping", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn rpc_error_object_is_surfaced() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc");
            then.status(200).json_body(json!({
                "id": 1,
                "jsonrpc": "2.0",
                "error": { "code": -32602, "message": "Invalid params." }
            }));
        });

        let err = client_for(&server)?.remove_episode(4).await.err();
        assert_eq!(
            err,
            Some(HostError::Rpc {
                operation: "remove_episode",
                code: -32602,
                message: "Invalid params.".into()
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn platform_picks_first_true_flag() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST)
                .path("/jsonrpc")
                .body_includes("System.Platform.Windows");
            then.status(200).json_body(rpc_result(&json!({
                "System.Platform.Android": false,
                "System.Platform.Linux": false,
                "System.Platform.Windows": true
            })));
        });

        assert_eq!(client_for(&server)?.platform().await?, Platform::Windows);
        Ok(())
    }

    #[tokio::test]
    async fn episodes_by_file_filters_on_directory_and_name() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/jsonrpc")
                .body_includes("\"method\":\"VideoLibrary.GetEpisodes\"")
                .body_includes("\"value\":\"/mnt/tv/Show/\"")
                .body_includes("\"value\":\"S01E02.mkv\"");
            then.status(200).json_body(rpc_result(&json!({
                "episodes": [{
                    "episodeid": 12,
                    "tvshowid": 3,
                    "file": "/mnt/tv/Show/S01E02.mkv",
                    "showtitle": "Show",
                    "title": "Second",
                    "season": 1,
                    "episode": 2,
                    "playcount": 3,
                    "lastplayed": "2024-01-02 20:00:00",
                    "dateadded": "2023-12-31 10:00:00",
                    "resume": { "position": 0.0, "total": 0.0 }
                }],
                "limits": { "start": 0, "end": 1, "total": 1 }
            })));
        });

        let episodes = client_for(&server)?
            .episodes_by_file("/mnt/tv/Show/S01E02.mkv")
            .await?;
        mock.assert();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].to_string(), "Show - S01E02 - Second");
        assert_eq!(episodes[0].metadata.play_count, 3);
        Ok(())
    }

    #[tokio::test]
    async fn missing_episode_list_means_empty() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc");
            then.status(200).json_body(rpc_result(&json!({
                "limits": { "start": 0, "end": 0, "total": 0 }
            })));
        });

        let episodes = client_for(&server)?
            .episodes_in_directory("/mnt/tv/Show/")
            .await?;
        assert!(episodes.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn set_metadata_formats_dates() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/jsonrpc")
                .body_includes("\"method\":\"VideoLibrary.SetEpisodeDetails\"")
                .body_includes("\"dateadded\":\"2023-12-31 10:00:00\"")
                .body_includes("\"lastplayed\":\"\"")
                .body_includes("\"playcount\":3");
            then.status(200).json_body(rpc_result(&json!("OK")));
        });

        let metadata = ItemMetadata {
            date_added: crate::wire::parse_date("2023-12-31 10:00:00"),
            last_played: None,
            play_count: 3,
            resume: relayarr_player_core::ResumePoint::default(),
        };
        client_for(&server)?.set_episode_metadata(40, &metadata).await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn play_episode_sends_resume_time() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/jsonrpc")
                .body_includes("\"method\":\"Player.Open\"")
                .body_includes("\"minutes\":1")
                .body_includes("\"seconds\":5");
            then.status(200).json_body(rpc_result(&json!("OK")));
        });

        client_for(&server)?
            .play_episode(40, Some(Duration::from_secs(65)))
            .await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn non_ok_result_is_invalid() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc");
            then.status(200).json_body(rpc_result(&json!("FAILED")));
        });

        assert!(matches!(
            client_for(&server)?.scan(None).await,
            Err(HostError::InvalidResponse { operation: "scan", .. })
        ));
        Ok(())
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(matches!(
            KodiClient::new("bad", "not a url", None, timeouts()),
            Err(KodiError::InvalidEndpoint { .. })
        ));
    }
}
