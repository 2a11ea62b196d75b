//! Default values for optional settings and the shipped settings template.
//!
//! # Design
//! - Serde `default = "..."` targets live here so the model stays declarative.
//! - The template is embedded so an untouched install can be detected without disk access.

/// Settings file shipped with the binary; left untouched it means "not configured yet".
pub const DEFAULT_CONFIG_YAML: &str = include_str!("default_config.yaml");

/// Settings path used when none is supplied.
pub const DEFAULT_CONFIG_PATH: &str = "settings.yaml";

pub(crate) const fn enabled() -> bool {
    true
}

pub(crate) fn log_directory() -> String {
    "logs".to_string()
}

pub(crate) const fn nfo_timeout_minutes() -> u64 {
    1
}

pub(crate) const fn probe_secs() -> u64 {
    5
}

pub(crate) const fn request_secs() -> u64 {
    5
}

pub(crate) const fn scan_secs() -> u64 {
    30 * 60
}

pub(crate) const fn clean_secs() -> u64 {
    30 * 60
}

pub(crate) const fn playback_wait_secs() -> u64 {
    10 * 60
}

pub(crate) const fn event_secs() -> u64 {
    60 * 60
}
