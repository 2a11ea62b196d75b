//! Typed settings document.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use relayarr_events::EventKind;
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root of `settings.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayConfig {
    /// Logging output.
    pub logs: LogConfig,
    /// Library behaviour.
    pub library: LibraryConfig,
    /// Per-call and per-event time budgets.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Global notification switches.
    pub notifications: NotificationSettings,
    /// Media hosts sharing the library.
    pub hosts: Vec<HostConfig>,
}

impl RelayConfig {
    /// Whether `host` should receive a notification for `kind`.
    ///
    /// A host override can only narrow the global switch.
    #[must_use]
    pub fn notifications_enabled(&self, host: &HostConfig, kind: EventKind) -> bool {
        self.notifications.enabled_for(kind)
            && !host.disable_notifications
            && host.notifications.get(&kind).copied().unwrap_or(true)
    }
}

/// Configured log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything.
    Debug,
    /// Progress messages.
    Info,
    /// Recoverable problems.
    Warning,
    /// Failures only.
    Critical,
}

impl LogLevel {
    /// Accepted spellings.
    pub const NAMES: [&'static str; 4] = ["DEBUG", "INFO", "WARNING", "CRITICAL"];

    /// Parse a configured level, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" => Some(Self::Warning),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Equivalent `tracing` filter directive.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Critical => "error",
        }
    }
}

/// Console/file output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// `logs` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// One of [`LogLevel::NAMES`].
    pub level: String,
    /// Also write a daily-rolling log file.
    #[serde(default)]
    pub write_file: bool,
    /// Directory for log files.
    #[serde(default = "defaults::log_directory")]
    pub directory: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LogConfig {
    /// Parsed level, falling back to `Info` for unvalidated documents.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        LogLevel::parse(&self.level).unwrap_or(LogLevel::Info)
    }
}

/// Source-prefix to target-prefix substitution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathMapping {
    /// Prefix as seen by the media manager.
    #[serde(alias = "sonarr")]
    pub source: String,
    /// Replacement prefix as seen by the media host.
    #[serde(alias = "kodi")]
    pub target: String,
}

/// `library` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct LibraryConfig {
    /// Run a library clean after each library update.
    #[serde(default)]
    pub clean_after_update: bool,
    /// Prefer hosts that are not playing anything.
    #[serde(default)]
    pub skip_active: bool,
    /// Fall back to one full scan when a targeted scan fails or finds nothing.
    #[serde(default)]
    pub full_scan_fallback: bool,
    /// Wait for NFO files before scanning.
    #[serde(default)]
    pub wait_for_nfo: bool,
    /// NFO wait budget per file.
    #[serde(default = "defaults::nfo_timeout_minutes", alias = "nfo_timeout_minuets")]
    pub nfo_timeout_minutes: u64,
    /// Global path mappings, applied after host-specific ones.
    #[serde(default)]
    pub path_mapping: Vec<PathMapping>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            clean_after_update: false,
            skip_active: false,
            full_scan_fallback: false,
            wait_for_nfo: false,
            nfo_timeout_minutes: defaults::nfo_timeout_minutes(),
            path_mapping: Vec::new(),
        }
    }
}

impl LibraryConfig {
    /// NFO wait budget for `files` companion files.
    #[must_use]
    pub fn nfo_timeout(&self, files: usize) -> Duration {
        let files = u64::try_from(files).unwrap_or(u64::MAX);
        Duration::from_secs(self.nfo_timeout_minutes.saturating_mul(60).saturating_mul(files))
    }
}

/// `timeouts` section; every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Liveness and state probes.
    #[serde(default = "defaults::probe_secs")]
    pub probe_secs: u64,
    /// Ordinary RPC calls.
    #[serde(default = "defaults::request_secs")]
    pub request_secs: u64,
    /// Waiting for a scan to complete.
    #[serde(default = "defaults::scan_secs")]
    pub scan_secs: u64,
    /// The clean RPC call itself.
    #[serde(default = "defaults::clean_secs")]
    pub clean_secs: u64,
    /// Waiting for an active player to go idle.
    #[serde(default = "defaults::playback_wait_secs")]
    pub playback_wait_secs: u64,
    /// Whole-event budget.
    #[serde(default = "defaults::event_secs")]
    pub event_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_secs: defaults::probe_secs(),
            request_secs: defaults::request_secs(),
            scan_secs: defaults::scan_secs(),
            clean_secs: defaults::clean_secs(),
            playback_wait_secs: defaults::playback_wait_secs(),
            event_secs: defaults::event_secs(),
        }
    }
}

impl TimeoutConfig {
    /// Probe timeout.
    #[must_use]
    pub const fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    /// Ordinary request timeout.
    #[must_use]
    pub const fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    /// Scan completion budget.
    #[must_use]
    pub const fn scan(&self) -> Duration {
        Duration::from_secs(self.scan_secs)
    }

    /// Clean call timeout.
    #[must_use]
    pub const fn clean(&self) -> Duration {
        Duration::from_secs(self.clean_secs)
    }

    /// Playback idle budget.
    #[must_use]
    pub const fn playback_wait(&self) -> Duration {
        Duration::from_secs(self.playback_wait_secs)
    }

    /// Whole-event budget.
    #[must_use]
    pub const fn event(&self) -> Duration {
        Duration::from_secs(self.event_secs)
    }
}

/// `notifications` section; missing switches default to on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct NotificationSettings {
    /// Release grabbed.
    #[serde(default = "defaults::enabled")]
    pub on_grab: bool,
    /// New episode imported.
    #[serde(default = "defaults::enabled")]
    pub on_download_new: bool,
    /// Episode upgraded.
    #[serde(default = "defaults::enabled")]
    pub on_download_upgrade: bool,
    /// Episode renamed.
    #[serde(default = "defaults::enabled")]
    pub on_rename: bool,
    /// Episode deleted.
    #[serde(default = "defaults::enabled")]
    pub on_delete: bool,
    /// Series added.
    #[serde(default = "defaults::enabled")]
    pub on_series_add: bool,
    /// Series deleted.
    #[serde(default = "defaults::enabled")]
    pub on_series_delete: bool,
    /// Health issue raised.
    #[serde(default = "defaults::enabled")]
    pub on_health_issue: bool,
    /// Health issue cleared.
    #[serde(default = "defaults::enabled")]
    pub on_health_restored: bool,
    /// Media manager updated.
    #[serde(default = "defaults::enabled")]
    pub on_application_update: bool,
    /// Manual interaction required.
    #[serde(default = "defaults::enabled")]
    pub on_manual_interaction_required: bool,
    /// Connection test.
    #[serde(default = "defaults::enabled")]
    pub on_test: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            on_grab: true,
            on_download_new: true,
            on_download_upgrade: true,
            on_rename: true,
            on_delete: true,
            on_series_add: true,
            on_series_delete: true,
            on_health_issue: true,
            on_health_restored: true,
            on_application_update: true,
            on_manual_interaction_required: true,
            on_test: true,
        }
    }
}

impl NotificationSettings {
    /// Global switch for `kind`.
    #[must_use]
    pub const fn enabled_for(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Grab => self.on_grab,
            EventKind::DownloadNew => self.on_download_new,
            EventKind::DownloadUpgrade => self.on_download_upgrade,
            EventKind::Rename => self.on_rename,
            EventKind::Delete => self.on_delete,
            EventKind::SeriesAdd => self.on_series_add,
            EventKind::SeriesDelete => self.on_series_delete,
            EventKind::HealthIssue => self.on_health_issue,
            EventKind::HealthRestored => self.on_health_restored,
            EventKind::ApplicationUpdate => self.on_application_update,
            EventKind::ManualInteractionRequired => self.on_manual_interaction_required,
            EventKind::Test => self.on_test,
        }
    }
}

/// One media host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    /// Unique display name.
    pub name: String,
    /// Address of the JSON-RPC endpoint.
    pub ip_addr: IpAddr,
    /// HTTP port of the JSON-RPC endpoint.
    pub port: u16,
    /// Basic-auth user.
    #[serde(default)]
    pub user: Option<String>,
    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
    /// Disabled hosts are ignored entirely.
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    /// Never send notifications to this host.
    #[serde(default)]
    pub disable_notifications: bool,
    /// Lower is preferred as executor.
    #[serde(default)]
    pub priority: u32,
    /// Host-specific mappings, checked before the global list.
    #[serde(default)]
    pub path_mapping: Vec<PathMapping>,
    /// Per-event notification overrides.
    #[serde(default)]
    pub notifications: BTreeMap<EventKind, bool>,
}

impl HostConfig {
    /// Basic-auth credentials when a user is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, Option<&str>)> {
        self.user
            .as_deref()
            .filter(|user| !user.is_empty())
            .map(|user| (user, self.password.as_deref()))
    }

    /// JSON-RPC endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        match self.ip_addr {
            IpAddr::V4(addr) => format!("http://{addr}:{}/jsonrpc", self.port),
            IpAddr::V6(addr) => format!("http://[{addr}]:{}/jsonrpc", self.port),
        }
    }
}
