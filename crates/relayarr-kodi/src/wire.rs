//! JSON-RPC envelopes and Kodi payload shapes.

use std::time::Duration;

use chrono::NaiveDateTime;
use relayarr_player_core::{
    ActivePlayer, EpisodeDetails, ItemMetadata, PlaybackPosition, PlayerItem, ResumePoint,
    ShowDetails,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Date format used by the Kodi library.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Episode properties requested on every episode lookup.
pub const EPISODE_PROPERTIES: [&str; 10] = [
    "lastplayed",
    "playcount",
    "file",
    "season",
    "episode",
    "tvshowid",
    "showtitle",
    "dateadded",
    "title",
    "resume",
];

/// Show properties requested on every show lookup.
pub const SHOW_PROPERTIES: [&str; 3] = ["title", "file", "year"];

/// Outgoing JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Correlation id.
    pub id: u64,
    /// Method name.
    pub method: &'a str,
    /// Parameters, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Incoming JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    /// Successful result.
    #[serde(default)]
    pub result: Option<Value>,
    /// Error object.
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    /// Error code.
    pub code: i64,
    /// Error message.
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireResume {
    #[serde(default)]
    position: f64,
    #[serde(default)]
    total: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEpisode {
    #[serde(rename = "episodeid")]
    id: i64,
    #[serde(rename = "tvshowid", default)]
    show_id: i64,
    #[serde(default)]
    file: String,
    #[serde(rename = "showtitle", default)]
    show_title: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    season: i64,
    #[serde(default)]
    episode: i64,
    #[serde(default)]
    playcount: i64,
    #[serde(default)]
    lastplayed: String,
    #[serde(default)]
    dateadded: String,
    #[serde(default)]
    resume: WireResume,
}

impl From<WireEpisode> for EpisodeDetails {
    fn from(wire: WireEpisode) -> Self {
        Self {
            id: wire.id,
            show_id: wire.show_id,
            file: wire.file,
            show_title: wire.show_title,
            episode_title: wire.title,
            season: u32::try_from(wire.season).unwrap_or(0),
            episode: u32::try_from(wire.episode).unwrap_or(0),
            metadata: ItemMetadata {
                date_added: parse_date(&wire.dateadded),
                last_played: parse_date(&wire.lastplayed),
                play_count: u32::try_from(wire.playcount).unwrap_or(0),
                resume: ResumePoint {
                    position_seconds: wire.resume.position,
                    total_seconds: wire.resume.total,
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EpisodeList {
    #[serde(default)]
    pub(crate) episodes: Vec<WireEpisode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpisodeDetailsResult {
    #[serde(rename = "episodedetails")]
    pub(crate) episode: WireEpisode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireShow {
    #[serde(rename = "tvshowid")]
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    file: String,
    #[serde(default)]
    year: i64,
}

impl From<WireShow> for ShowDetails {
    fn from(wire: WireShow) -> Self {
        Self {
            id: wire.id,
            title: wire.title,
            file: wire.file,
            year: i32::try_from(wire.year).ok().filter(|year| *year > 0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ShowList {
    #[serde(default)]
    pub(crate) tvshows: Vec<WireShow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePlayer {
    #[serde(rename = "playerid")]
    id: i64,
    #[serde(rename = "type", default)]
    media_type: String,
}

impl From<WirePlayer> for ActivePlayer {
    fn from(wire: WirePlayer) -> Self {
        Self {
            id: wire.id,
            media_type: wire.media_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerItemResult {
    pub(crate) item: WireItem,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireItem {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    label: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    file: Option<String>,
}

impl WireItem {
    /// Kodi reports an `unknown` item with no label or file when the player is empty.
    pub(crate) fn into_item(self) -> Option<PlayerItem> {
        let empty = self.kind == "unknown"
            && self.label.is_empty()
            && self.file.as_deref().is_none_or(str::is_empty);
        (!empty).then(|| PlayerItem {
            id: self.id,
            label: self.label,
            kind: self.kind,
            file: self.file.filter(|file| !file.is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct WireTime {
    #[serde(default)]
    hours: u64,
    #[serde(default)]
    minutes: u64,
    #[serde(default)]
    seconds: u64,
    #[serde(default)]
    milliseconds: u64,
}

impl WireTime {
    pub(crate) const fn to_duration(&self) -> Duration {
        Duration::from_millis(
            ((self.hours * 60 + self.minutes) * 60 + self.seconds) * 1000 + self.milliseconds,
        )
    }

    pub(crate) fn from_duration(duration: Duration) -> Self {
        let total = duration.as_secs();
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
            milliseconds: u64::from(duration.subsec_millis()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerProperties {
    #[serde(default)]
    time: WireTime,
    #[serde(default)]
    percentage: f64,
}

impl From<PlayerProperties> for PlaybackPosition {
    fn from(wire: PlayerProperties) -> Self {
        Self {
            elapsed: wire.time.to_duration(),
            percentage: wire.percentage,
        }
    }
}

/// Parameters for `VideoLibrary.SetEpisodeDetails`.
pub(crate) fn set_episode_params(id: i64, metadata: &ItemMetadata) -> Value {
    json!({
        "episodeid": id,
        "playcount": metadata.play_count,
        "lastplayed": format_date(metadata.last_played),
        "dateadded": format_date(metadata.date_added),
        "resume": {
            "position": metadata.resume.position_seconds,
            "total": metadata.resume.total_seconds,
        },
    })
}

/// `startswith path` filter.
pub(crate) fn path_filter(directory: &str) -> Value {
    json!({"operator": "startswith", "field": "path", "value": directory})
}

/// Kodi dates are `YYYY-MM-DD HH:MM:SS`; an empty string means "never".
pub(crate) fn parse_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub(crate) fn format_date(value: Option<NaiveDateTime>) -> String {
    value
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Split a host path into `(directory with trailing separator, file name)`.
pub(crate) fn split_file_path(path: &str) -> (&str, &str) {
    path.rfind(['/', '\\'])
        .map_or(("", path), |index| (&path[..=index], &path[index + 1..]))
}
