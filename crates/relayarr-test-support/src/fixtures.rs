//! Builders for configuration, events and library records used by the suites.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use relayarr_config::{
    HostConfig, LibraryConfig, LogConfig, LogFormat, NotificationSettings, PathMapping,
    RelayConfig, TimeoutConfig,
};
use relayarr_events::Series;
use relayarr_player_core::{EpisodeDetails, ItemMetadata, ResumePoint};

/// Source-side root shared by the fixtures.
pub const SOURCE_ROOT: &str = "/data/tv";
/// Host-side root the fixtures map [`SOURCE_ROOT`] onto.
pub const HOST_ROOT: &str = "/mnt/tv";

/// Enabled host on loopback with the given priority.
#[must_use]
pub fn host_config(name: &str, priority: u32) -> HostConfig {
    HostConfig {
        name: name.to_string(),
        ip_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 8080,
        user: Some("kodi".to_string()),
        password: Some("kodi".to_string()),
        enabled: true,
        disable_notifications: false,
        priority,
        path_mapping: Vec::new(),
        notifications: BTreeMap::new(),
    }
}

/// Relay configuration mapping [`SOURCE_ROOT`] to [`HOST_ROOT`] with default behaviour.
#[must_use]
pub fn relay_config(hosts: Vec<HostConfig>) -> RelayConfig {
    RelayConfig {
        logs: LogConfig {
            level: "DEBUG".to_string(),
            write_file: false,
            directory: "logs".to_string(),
            format: LogFormat::Pretty,
        },
        library: LibraryConfig {
            path_mapping: vec![PathMapping {
                source: SOURCE_ROOT.to_string(),
                target: HOST_ROOT.to_string(),
            }],
            ..LibraryConfig::default()
        },
        timeouts: TimeoutConfig::default(),
        notifications: NotificationSettings::default(),
        hosts,
    }
}

/// Series rooted under [`SOURCE_ROOT`].
#[must_use]
pub fn series(title: &str, year: i32) -> Series {
    Series {
        title: title.to_string(),
        year: Some(year),
        path: format!("{SOURCE_ROOT}/{title}"),
    }
}

/// Source-side path of an episode file of `series`.
#[must_use]
pub fn source_file(series: &Series, name: &str) -> String {
    format!("{}/{name}", series.path)
}

/// Host-side path of an episode file of the series titled `title`.
#[must_use]
pub fn host_file(title: &str, name: &str) -> String {
    format!("{HOST_ROOT}/{title}/{name}")
}

/// Host-side directory of the series titled `title`, with trailing separator.
#[must_use]
pub fn host_dir(title: &str) -> String {
    format!("{HOST_ROOT}/{title}/")
}

/// Unsaved episode record; the fake library assigns ids on insert.
#[must_use]
pub fn episode(show: &str, name: &str, season: u32, number: u32) -> EpisodeDetails {
    EpisodeDetails {
        id: 0,
        show_id: 0,
        file: host_file(show, name),
        show_title: show.to_string(),
        episode_title: format!("Episode {number}"),
        season,
        episode: number,
        metadata: ItemMetadata::default(),
    }
}

/// Watched-state metadata with the given add date (`YYYY-MM-DD HH:MM:SS`) and play count.
///
/// # Errors
///
/// Returns an error if `date_added` is not in the library date format.
pub fn watched(date_added: &str, play_count: u32) -> Result<ItemMetadata> {
    let date_added = NaiveDateTime::parse_from_str(date_added, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid fixture date {date_added}"))?;
    Ok(ItemMetadata {
        date_added: Some(date_added),
        last_played: Some(date_added),
        play_count,
        resume: ResumePoint {
            position_seconds: 120.0,
            total_seconds: 1800.0,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_paths_line_up_under_mapping() {
        let show = series("Show", 2020);
        assert_eq!(source_file(&show, "S01E01.mkv"), "/data/tv/Show/S01E01.mkv");
        assert_eq!(host_file("Show", "S01E01.mkv"), "/mnt/tv/Show/S01E01.mkv");
        assert_eq!(host_dir("Show"), "/mnt/tv/Show/");
    }

    #[test]
    fn watched_rejects_bad_dates() {
        assert!(watched("yesterday", 1).is_err());
        assert!(watched("2024-01-01 10:00:00", 3).is_ok_and(|meta| meta.play_count == 3));
    }
}
