//! Library and playback domain types shared across the workspace.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Library identifier of an episode.
pub type EpisodeId = i64;
/// Library identifier of a TV show.
pub type ShowId = i64;
/// Identifier of an active player.
pub type PlayerId = i64;

/// Operating system a media host runs on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Android.
    Android,
    /// Darwin (generic Apple).
    Darwin,
    /// iOS.
    Ios,
    /// Linux.
    Linux,
    /// macOS.
    Osx,
    /// tvOS.
    Tvos,
    /// Universal Windows Platform.
    Uwp,
    /// Windows desktop.
    Windows,
    /// Platform could not be determined.
    Unknown,
}

impl Platform {
    /// Every platform the host can report, in probe order.
    pub const KNOWN: [Self; 8] = [
        Self::Android,
        Self::Darwin,
        Self::Ios,
        Self::Linux,
        Self::Osx,
        Self::Tvos,
        Self::Uwp,
        Self::Windows,
    ];

    /// Info boolean name the player exposes for this platform.
    #[must_use]
    pub const fn info_label(self) -> &'static str {
        match self {
            Self::Android => "System.Platform.Android",
            Self::Darwin => "System.Platform.Darwin",
            Self::Ios => "System.Platform.IOS",
            Self::Linux => "System.Platform.Linux",
            Self::Osx => "System.Platform.OSX",
            Self::Tvos => "System.Platform.TVOS",
            Self::Uwp => "System.Platform.UWP",
            Self::Windows => "System.Platform.Windows",
            Self::Unknown => "Unknown",
        }
    }

    /// Path convention of the platform; `None` when unknown.
    #[must_use]
    pub const fn path_style(self) -> Option<PathStyle> {
        match self {
            Self::Windows | Self::Uwp => Some(PathStyle::Windows),
            Self::Unknown => None,
            Self::Android | Self::Darwin | Self::Ios | Self::Linux | Self::Osx | Self::Tvos => {
                Some(PathStyle::Posix)
            }
        }
    }
}

/// Separator convention for host-side paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// Forward slashes.
    Posix,
    /// Backslashes.
    Windows,
}

impl PathStyle {
    /// Separator character for this style.
    #[must_use]
    pub const fn separator(self) -> char {
        match self {
            Self::Posix => '/',
            Self::Windows => '\\',
        }
    }
}

/// Saved resume point of a library item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct ResumePoint {
    /// Resume position in seconds.
    pub position_seconds: f64,
    /// Total runtime in seconds.
    pub total_seconds: f64,
}

/// Mutable per-library fields that a rescan would otherwise reset.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ItemMetadata {
    /// When the item was first added to the library.
    pub date_added: Option<NaiveDateTime>,
    /// When the item was last played.
    pub last_played: Option<NaiveDateTime>,
    /// Number of completed plays.
    pub play_count: u32,
    /// Partial-watch resume point.
    pub resume: ResumePoint,
}

/// Episode as stored in the player library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeDetails {
    /// Library identifier.
    pub id: EpisodeId,
    /// Library identifier of the owning show.
    pub show_id: ShowId,
    /// Host-side file path.
    pub file: String,
    /// Title of the owning show.
    pub show_title: String,
    /// Episode title.
    pub episode_title: String,
    /// Season number.
    pub season: u32,
    /// Episode number within the season.
    pub episode: u32,
    /// Per-library mutable fields.
    pub metadata: ItemMetadata,
}

impl EpisodeDetails {
    /// Whether both records describe the same logical episode (show, season, episode).
    #[must_use]
    pub fn same_episode(&self, other: &Self) -> bool {
        self.show_title == other.show_title
            && self.season == other.season
            && self.episode == other.episode
    }
}

impl Display for EpisodeDetails {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} - S{:02}E{:02} - {}",
            self.show_title, self.season, self.episode, self.episode_title
        )
    }
}

/// TV show as stored in the player library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowDetails {
    /// Library identifier.
    pub id: ShowId,
    /// Show title.
    pub title: String,
    /// Host-side directory of the show.
    pub file: String,
    /// Premiere year when known.
    pub year: Option<i32>,
}

/// Player currently active on a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivePlayer {
    /// Player identifier.
    pub id: PlayerId,
    /// Media type handled by the player (`video`, `audio`, `picture`).
    pub media_type: String,
}

impl ActivePlayer {
    /// Whether this player is playing video.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.media_type.eq_ignore_ascii_case("video")
    }
}

/// Item loaded in an active player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerItem {
    /// Library identifier when the item belongs to the library.
    pub id: Option<i64>,
    /// Display label.
    pub label: String,
    /// Item kind (`episode`, `movie`, `unknown`, ...).
    pub kind: String,
    /// Host-side file path when reported.
    pub file: Option<String>,
}

impl PlayerItem {
    /// Library episode id if the item is an episode.
    #[must_use]
    pub fn episode_id(&self) -> Option<EpisodeId> {
        (self.kind == "episode").then_some(self.id).flatten()
    }
}

/// Position of an active player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackPosition {
    /// Elapsed play time.
    pub elapsed: Duration,
    /// Progress through the item, 0-100.
    pub percentage: f64,
}

/// On-screen notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Heading line.
    pub title: String,
    /// Body text.
    pub message: String,
    /// How long the toast stays on screen.
    pub display_time: Duration,
    /// Icon URL or path.
    pub image: String,
}

impl Notification {
    /// Default toast duration.
    pub const DEFAULT_DISPLAY_TIME: Duration = Duration::from_millis(5000);
    /// Default icon.
    pub const DEFAULT_IMAGE: &'static str =
        "https://github.com/jsaddiction/KodiLibrarian/raw/main/img/Sonarr.png";

    #[must_use]
    /// Build a notification with the default display time and icon.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            display_time: Self::DEFAULT_DISPLAY_TIME,
            image: Self::DEFAULT_IMAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(id: EpisodeId, season: u32, number: u32) -> EpisodeDetails {
        EpisodeDetails {
            id,
            show_id: 7,
            file: format!("/tv/Show/S{season:02}E{number:02}.mkv"),
            show_title: "Show".into(),
            episode_title: "Pilot".into(),
            season,
            episode: number,
            metadata: ItemMetadata::default(),
        }
    }

    #[test]
    fn episodes_display_with_padded_numbers() {
        assert_eq!(episode(1, 1, 2).to_string(), "Show - S01E02 - Pilot");
    }

    #[test]
    fn same_episode_ignores_library_ids_and_files() {
        let old = episode(1, 1, 2);
        let mut replacement = episode(44, 1, 2);
        replacement.file = "/tv/Show/S01E02.2160p.mkv".into();
        assert!(old.same_episode(&replacement));
        assert!(!old.same_episode(&episode(2, 1, 3)));
    }

    #[test]
    fn platform_path_style_defaults() {
        assert_eq!(Platform::Linux.path_style(), Some(PathStyle::Posix));
        assert_eq!(Platform::Windows.path_style(), Some(PathStyle::Windows));
        assert_eq!(Platform::Unknown.path_style(), None);
        assert!(Platform::KNOWN.iter().all(|p| p.info_label().starts_with("System.Platform.")));
    }

    #[test]
    fn player_item_episode_id_requires_episode_kind() {
        let item = PlayerItem {
            id: Some(9),
            label: "Pilot".into(),
            kind: "episode".into(),
            file: None,
        };
        assert_eq!(item.episode_id(), Some(9));
        let movie = PlayerItem {
            kind: "movie".into(),
            ..item
        };
        assert_eq!(movie.episode_id(), None);
    }

    #[test]
    fn notification_defaults() {
        let note = Notification::new("Title", "Body");
        assert_eq!(note.display_time, Duration::from_millis(5000));
        assert!(!note.image.is_empty());
    }
}
