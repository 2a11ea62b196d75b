//! Normalisation of the Sonarr custom-script environment into [`LibraryEvent`]s.
//!
//! Sonarr passes event data as `Sonarr_*` environment variables. Names are matched
//! case-insensitively; string lists are `|`-separated and number lists `,`-separated.

use std::collections::HashMap;

use crate::error::{IngressError, IngressResult};
use crate::payloads::{DeleteReason, LibraryEvent, Series};

const EVENT_TYPE: &str = "sonarr_eventtype";
const SERIES_TITLE: &str = "sonarr_series_title";
const SERIES_YEAR: &str = "sonarr_series_year";
const SERIES_PATH: &str = "sonarr_series_path";
const SERIES_DELETED_FILES: &str = "sonarr_series_deletedfiles";
const RELEASE_SEASON: &str = "sonarr_release_seasonnumber";
const RELEASE_EPISODE_NUMBERS: &str = "sonarr_release_episodenumbers";
const RELEASE_EPISODE_TITLES: &str = "sonarr_release_episodetitles";
const EPISODE_FILE_PATH: &str = "sonarr_episodefile_path";
const EPISODE_FILE_PREVIOUS_PATHS: &str = "sonarr_episodefile_previouspaths";
const EPISODE_FILE_RELATIVE_PATHS: &str = "sonarr_episodefile_relativepaths";
const EPISODE_FILE_DELETE_REASON: &str = "sonarr_episodefile_deletereason";
const DELETED_PATHS: &str = "sonarr_deletedpaths";
const IS_UPGRADE: &str = "sonarr_isupgrade";
const HEALTH_ISSUE_MESSAGE: &str = "sonarr_health_issue_message";
const HEALTH_ISSUE_TYPE: &str = "sonarr_health_issue_type";
const HEALTH_RESTORED_MESSAGE: &str = "sonarr_health_restored_message";
const HEALTH_RESTORED_TYPE: &str = "sonarr_health_restored_type";
const UPDATE_MESSAGE: &str = "sonarr_update_message";
const UPDATE_PREVIOUS_VERSION: &str = "sonarr_update_previousversion";
const UPDATE_NEW_VERSION: &str = "sonarr_update_newversion";

/// Snapshot of the `Sonarr_*` variables of one script invocation.
#[derive(Debug, Clone, Default)]
pub struct SonarrEnvironment {
    vars: HashMap<String, String>,
}

impl SonarrEnvironment {
    /// Capture the variables of the current process.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from arbitrary key/value pairs; keys without the `sonarr` prefix are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let key = key.as_ref().trim().to_ascii_lowercase();
                key.starts_with("sonarr").then(|| (key, value.into()))
            })
            .collect();
        Self { vars }
    }

    /// Raw event type value, if any.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.text(EVENT_TYPE)
    }

    /// Captured variables, lowercase keys, sorted by key.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut vars: Vec<_> = self
            .vars
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        vars.sort_unstable();
        vars.into_iter()
    }

    /// Build the typed event.
    ///
    /// # Errors
    ///
    /// Returns [`IngressError`] when the event type is missing or unknown, a variable the
    /// event needs is absent, or a boolean/number variable does not parse.
    pub fn to_event(&self) -> IngressResult<LibraryEvent> {
        let raw = self.event_type().ok_or(IngressError::MissingEventType)?;
        let event = match raw.to_ascii_lowercase().as_str() {
            "grab" => LibraryEvent::Grab {
                series: self.series()?,
                season: self.number(RELEASE_SEASON, "Sonarr_Release_SeasonNumber")?,
                episode_numbers: self
                    .numbers(RELEASE_EPISODE_NUMBERS, "Sonarr_Release_EpisodeNumbers")?,
                episode_titles: self.list(RELEASE_EPISODE_TITLES),
            },
            "download" => {
                let series = self.series()?;
                let episode_file =
                    self.required(EPISODE_FILE_PATH, "Sonarr_EpisodeFile_Path")?;
                if self.flag(IS_UPGRADE, "Sonarr_IsUpgrade")?.unwrap_or(false) {
                    LibraryEvent::DownloadUpgrade {
                        series,
                        episode_file,
                        deleted_paths: self.list(DELETED_PATHS),
                    }
                } else {
                    LibraryEvent::DownloadNew {
                        series,
                        episode_file,
                    }
                }
            }
            "rename" => LibraryEvent::Rename {
                series: self.series()?,
                previous_paths: self.list(EPISODE_FILE_PREVIOUS_PATHS),
                relative_paths: self.list(EPISODE_FILE_RELATIVE_PATHS),
            },
            "episodefiledelete" => LibraryEvent::Delete {
                series: self.series()?,
                episode_file: self.required(EPISODE_FILE_PATH, "Sonarr_EpisodeFile_Path")?,
                reason: self
                    .text(EPISODE_FILE_DELETE_REASON)
                    .map_or(DeleteReason::Manual, DeleteReason::parse),
            },
            "seriesadd" => LibraryEvent::SeriesAdd {
                series: self.series()?,
            },
            "seriesdelete" => LibraryEvent::SeriesDelete {
                series: self.series()?,
                deleted_files: self
                    .flag(SERIES_DELETED_FILES, "Sonarr_Series_DeletedFiles")?
                    .unwrap_or(false),
            },
            "healthissue" => LibraryEvent::HealthIssue {
                message: self.owned(HEALTH_ISSUE_MESSAGE).unwrap_or_default(),
                issue_type: self.owned(HEALTH_ISSUE_TYPE),
            },
            "healthrestored" => LibraryEvent::HealthRestored {
                message: self.owned(HEALTH_RESTORED_MESSAGE).unwrap_or_default(),
                issue_type: self.owned(HEALTH_RESTORED_TYPE),
            },
            "applicationupdate" => LibraryEvent::ApplicationUpdate {
                message: self.owned(UPDATE_MESSAGE).unwrap_or_default(),
                previous_version: self.owned(UPDATE_PREVIOUS_VERSION),
                new_version: self.owned(UPDATE_NEW_VERSION),
            },
            "manualinteractionrequired" => LibraryEvent::ManualInteractionRequired {
                series: self.series()?,
            },
            "test" => LibraryEvent::Test,
            _ => {
                return Err(IngressError::UnknownEventType {
                    value: raw.to_string(),
                });
            }
        };
        Ok(event)
    }

    fn series(&self) -> IngressResult<Series> {
        Ok(Series {
            title: self.owned(SERIES_TITLE).unwrap_or_default(),
            year: self.number(SERIES_YEAR, "Sonarr_Series_Year")?,
            path: self.required(SERIES_PATH, "Sonarr_Series_Path")?,
        })
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.text(key).map(str::to_string)
    }

    fn required(&self, key: &str, name: &'static str) -> IngressResult<String> {
        self.owned(key)
            .ok_or(IngressError::MissingVariable { name })
    }

    fn flag(&self, key: &str, name: &'static str) -> IngressResult<Option<bool>> {
        self.text(key)
            .map(|value| match value.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(IngressError::InvalidBoolean {
                    name,
                    value: value.to_string(),
                }),
            })
            .transpose()
    }

    fn number<T: std::str::FromStr>(
        &self,
        key: &str,
        name: &'static str,
    ) -> IngressResult<Option<T>> {
        self.text(key).map(|value| parse_number(value, name)).transpose()
    }

    fn numbers(&self, key: &str, name: &'static str) -> IngressResult<Vec<u32>> {
        self.text(key).map_or_else(
            || Ok(Vec::new()),
            |value| {
                value
                    .split(',')
                    .map(|item| parse_number(item.trim(), name))
                    .collect()
            },
        )
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.text(key)
            .map(|value| {
                value
                    .split('|')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &'static str) -> IngressResult<T> {
    value.parse().map_err(|_| IngressError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::EventKind;

    fn env(pairs: &[(&str, &str)]) -> SonarrEnvironment {
        SonarrEnvironment::from_vars(pairs.iter().map(|(k, v)| (*k, (*v).to_string())))
    }

    const SERIES: [(&str, &str); 3] = [
        ("Sonarr_Series_Title", "Andor"),
        ("Sonarr_Series_Year", "2022"),
        ("Sonarr_Series_Path", "/tv/Andor"),
    ];

    #[test]
    fn download_without_upgrade_flag_is_new() -> anyhow::Result<()> {
        let mut pairs = SERIES.to_vec();
        pairs.push(("Sonarr_EventType", "Download"));
        pairs.push(("Sonarr_EpisodeFile_Path", "/tv/Andor/S01E01.mkv"));
        let event = env(&pairs).to_event()?;
        assert_eq!(event.kind(), EventKind::DownloadNew);
        assert_eq!(
            event.series().map(|series| series.year),
            Some(Some(2022))
        );
        Ok(())
    }

    #[test]
    fn download_upgrade_splits_deleted_paths() -> anyhow::Result<()> {
        let mut pairs = SERIES.to_vec();
        pairs.extend([
            ("SONARR_EVENTTYPE", "download"),
            ("sonarr_isupgrade", "True"),
            ("Sonarr_EpisodeFile_Path", "/tv/Andor/S01E01.2160p.mkv"),
            ("Sonarr_DeletedPaths", "/tv/Andor/a.mkv| /tv/Andor/b.mkv"),
        ]);
        let event = env(&pairs).to_event()?;
        assert_eq!(
            event,
            LibraryEvent::DownloadUpgrade {
                series: Series {
                    title: "Andor".into(),
                    year: Some(2022),
                    path: "/tv/Andor".into(),
                },
                episode_file: "/tv/Andor/S01E01.2160p.mkv".into(),
                deleted_paths: vec!["/tv/Andor/a.mkv".into(), "/tv/Andor/b.mkv".into()],
            }
        );
        Ok(())
    }

    #[test]
    fn grab_parses_number_lists() -> anyhow::Result<()> {
        let mut pairs = SERIES.to_vec();
        pairs.extend([
            ("Sonarr_EventType", "Grab"),
            ("Sonarr_Release_SeasonNumber", "1"),
            ("Sonarr_Release_EpisodeNumbers", "3, 4"),
            ("Sonarr_Release_EpisodeTitles", "Reckoning|Aldhani"),
        ]);
        match env(&pairs).to_event()? {
            LibraryEvent::Grab {
                season,
                episode_numbers,
                episode_titles,
                ..
            } => {
                assert_eq!(season, Some(1));
                assert_eq!(episode_numbers, vec![3, 4]);
                assert_eq!(episode_titles, vec!["Reckoning", "Aldhani"]);
            }
            other => anyhow::bail!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn delete_reason_defaults_to_manual() -> anyhow::Result<()> {
        let mut pairs = SERIES.to_vec();
        pairs.extend([
            ("Sonarr_EventType", "EpisodeFileDelete"),
            ("Sonarr_EpisodeFile_Path", "/tv/Andor/S01E01.mkv"),
        ]);
        match env(&pairs).to_event()? {
            LibraryEvent::Delete { reason, .. } => assert_eq!(reason, DeleteReason::Manual),
            other => anyhow::bail!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn non_sonarr_variables_are_ignored() -> anyhow::Result<()> {
        let event = env(&[("PATH", "/usr/bin"), ("Sonarr_EventType", "Test")]).to_event()?;
        assert_eq!(event, LibraryEvent::Test);
        Ok(())
    }

    #[test]
    fn missing_and_unknown_event_types_are_rejected() {
        assert_eq!(
            env(&[]).to_event().err(),
            Some(IngressError::MissingEventType)
        );
        assert_eq!(
            env(&[("Sonarr_EventType", "Bogus")]).to_event().err(),
            Some(IngressError::UnknownEventType {
                value: "Bogus".into()
            })
        );
    }

    #[test]
    fn invalid_values_are_reported_with_variable_name() {
        let mut pairs = SERIES.to_vec();
        pairs.extend([
            ("Sonarr_EventType", "SeriesDelete"),
            ("Sonarr_Series_DeletedFiles", "maybe"),
        ]);
        assert_eq!(
            env(&pairs).to_event().err(),
            Some(IngressError::InvalidBoolean {
                name: "Sonarr_Series_DeletedFiles",
                value: "maybe".into()
            })
        );

        let missing_path = env(&[("Sonarr_EventType", "SeriesAdd")]).to_event();
        assert_eq!(
            missing_path.err(),
            Some(IngressError::MissingVariable {
                name: "Sonarr_Series_Path"
            })
        );
    }
}
