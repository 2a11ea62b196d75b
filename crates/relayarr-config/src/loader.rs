//! Reading, parsing and validating `settings.yaml`.
//!
//! # Design
//! - Parse into the typed model first, then run field checks from `validate.rs`.
//! - The shipped template parses through the same path so default detection compares models,
//!   not bytes.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::defaults::DEFAULT_CONFIG_YAML;
use crate::error::{ConfigError, ConfigResult};
use crate::model::RelayConfig;
use crate::validate::validate;

/// Loads relay settings from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, parse and validate the settings file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, [`ConfigError::Parse`]
    /// when it is not a valid document and [`ConfigError::InvalidField`] when a field fails
    /// validation.
    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<RelayConfig> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), bytes = raw.len(), "read configuration file");
        Self::parse(&raw, path)
    }

    /// Parse and validate an in-memory document; `origin` is only used for error context.
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::load`].
    pub fn parse(raw: &str, origin: &Path) -> ConfigResult<RelayConfig> {
        let config: RelayConfig =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        validate(&config)?;
        Ok(config)
    }

    /// The template shipped with the binary.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded template itself is malformed.
    pub fn shipped_default() -> ConfigResult<RelayConfig> {
        Self::parse(DEFAULT_CONFIG_YAML, &PathBuf::from("<embedded default>"))
    }
}

impl RelayConfig {
    /// Whether this is still the untouched shipped template.
    #[must_use]
    pub fn is_default(&self) -> bool {
        ConfigLoader::shipped_default().is_ok_and(|default| default == *self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use relayarr_events::EventKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LEGACY: &str = r"
logs:
  level: debug
  write_file: true
library:
  clean_after_update: true
  skip_active: true
  full_scan_fallback: true
  wait_for_nfo: true
  nfo_timeout_minuets: 3
  path_mapping:
    - sonarr: /tv
      kodi: smb://nas/tv
notifications:
  on_grab: false
  on_download_new: true
  on_download_upgrade: true
  on_rename: true
  on_delete: true
  on_series_add: true
  on_series_delete: true
  on_health_issue: true
  on_health_restored: true
  on_application_update: true
  on_manual_interaction_required: true
hosts:
  - name: Bedroom
    ip_addr: 192.168.1.20
    port: 8080
    user: kodi
    password: secret
    enabled: true
    disable_notifications: false
    priority: 1
    notifications:
      download_new: false
";

    fn write_temp(contents: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        Ok(file)
    }

    #[tokio::test]
    async fn loads_original_key_names() -> Result<()> {
        let file = write_temp(LEGACY)?;
        let config = ConfigLoader::load(file.path()).await?;

        assert_eq!(config.library.nfo_timeout_minutes, 3);
        assert_eq!(config.library.path_mapping[0].source, "/tv");
        assert_eq!(config.library.path_mapping[0].target, "smb://nas/tv");
        assert!(config.notifications.on_test);
        assert_eq!(config.timeouts.scan_secs, 1800);
        let host = &config.hosts[0];
        assert!(!config.notifications_enabled(host, EventKind::DownloadNew));
        assert!(config.notifications_enabled(host, EventKind::Rename));
        assert!(!config.is_default());
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_reports_read_error() {
        let result = ConfigLoader::load("/definitely/not/here/settings.yaml").await;
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn malformed_document_reports_parse_error() {
        let result = ConfigLoader::parse("logs: [", Path::new("inline.yaml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn duplicate_host_names_are_rejected() {
        let doubled = LEGACY.replace(
            "    notifications:\n      download_new: false\n",
            "  - name: bedroom\n    ip_addr: 192.168.1.21\n    port: 8080\n",
        );
        let err = ConfigLoader::parse(&doubled, Path::new("inline.yaml"));
        assert!(matches!(
            err,
            Err(ConfigError::InvalidField { ref field, reason: "must be unique", .. })
                if field == "name"
        ));
    }

    #[test]
    fn unknown_log_level_and_zero_port_are_rejected() {
        let bad_level = LEGACY.replace("level: debug", "level: verbose");
        assert!(matches!(
            ConfigLoader::parse(&bad_level, Path::new("inline.yaml")),
            Err(ConfigError::InvalidField { ref field, .. }) if field == "level"
        ));

        let bad_port = LEGACY.replace("port: 8080", "port: 0");
        assert!(matches!(
            ConfigLoader::parse(&bad_port, Path::new("inline.yaml")),
            Err(ConfigError::InvalidField { ref field, .. }) if field == "port"
        ));
    }

    #[test]
    fn shipped_template_is_detected_as_default() -> Result<()> {
        let config = ConfigLoader::shipped_default()?;
        assert!(config.is_default());

        let mut edited = config;
        edited.hosts[0].priority = 3;
        assert!(!edited.is_default());
        Ok(())
    }
}
