//! Field checks applied after a settings document parses.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{LogLevel, PathMapping, RelayConfig};

/// Validate a parsed document, reporting the first offending field.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the section, field and reason.
pub fn validate(config: &RelayConfig) -> ConfigResult<()> {
    if LogLevel::parse(&config.logs.level).is_none() {
        return Err(invalid(
            "logs",
            "level",
            Some(&config.logs.level),
            "must be one of DEBUG, INFO, WARNING, CRITICAL",
        ));
    }
    if config.logs.write_file && config.logs.directory.trim().is_empty() {
        return Err(invalid("logs", "directory", None, "must not be empty"));
    }

    if config.library.wait_for_nfo && config.library.nfo_timeout_minutes == 0 {
        return Err(invalid(
            "library",
            "nfo_timeout_minutes",
            Some("0"),
            "must be positive when wait_for_nfo is set",
        ));
    }
    validate_mappings("library", &config.library.path_mapping)?;

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("probe_secs", timeouts.probe_secs),
        ("request_secs", timeouts.request_secs),
        ("scan_secs", timeouts.scan_secs),
        ("clean_secs", timeouts.clean_secs),
        ("playback_wait_secs", timeouts.playback_wait_secs),
        ("event_secs", timeouts.event_secs),
    ] {
        if value == 0 {
            return Err(invalid("timeouts", field, Some("0"), "must be positive"));
        }
    }

    if config.hosts.is_empty() {
        return Err(invalid("hosts", "hosts", None, "at least one host is required"));
    }
    let mut names = HashSet::new();
    for host in &config.hosts {
        let name = host.name.trim();
        if name.is_empty() {
            return Err(invalid("hosts", "name", None, "must not be empty"));
        }
        if !names.insert(name.to_ascii_lowercase()) {
            return Err(invalid("hosts", "name", Some(name), "must be unique"));
        }
        if host.port == 0 {
            return Err(invalid(
                &format!("hosts.{name}"),
                "port",
                Some("0"),
                "must be between 1 and 65535",
            ));
        }
        validate_mappings(&format!("hosts.{name}"), &host.path_mapping)?;
    }
    Ok(())
}

fn validate_mappings(section: &str, mappings: &[PathMapping]) -> ConfigResult<()> {
    for mapping in mappings {
        if mapping.source.trim().is_empty() {
            return Err(invalid(section, "path_mapping.source", None, "must not be empty"));
        }
        if mapping.target.trim().is_empty() {
            return Err(invalid(
                section,
                "path_mapping.target",
                Some(&mapping.source),
                "must not be empty",
            ));
        }
    }
    Ok(())
}

fn invalid(section: &str, field: &str, value: Option<&str>, reason: &'static str) -> ConfigError {
    ConfigError::InvalidField {
        section: section.to_string(),
        field: field.to_string(),
        value: value.map(str::to_string),
        reason,
    }
}
