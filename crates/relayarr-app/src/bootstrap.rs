//! Process bootstrap: configuration, logging, event ingress and processing.
//!
//! # Design
//! - Failures before logging is installed go to stderr; everything after goes through `tracing`.
//! - The exit code comes from [`AppError::exit_code`] or [`EventOutcome::exit_code`].
//! - An untouched shipped configuration stops the run before any host is contacted.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use relayarr_config::{ConfigLoader, LogConfig, RelayConfig};
use relayarr_events::SonarrEnvironment;
use relayarr_telemetry::{LogFormat, LoggingConfig, TelemetryGuard, init_logging};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cli::Cli;
use crate::companion::LocalFilesystem;
use crate::error::{AppError, AppResult};
use crate::orchestrator::Orchestrator;
use crate::outcome::EventOutcome;
use crate::registry::HostRegistry;

/// Parse arguments, relay the event described by the process environment and return the
/// process exit code.
pub async fn run() -> i32 {
    run_with(Cli::parse(), SonarrEnvironment::from_process()).await
}

/// Boot sequence over injected arguments and environment.
pub async fn run_with(cli: Cli, environment: SonarrEnvironment) -> i32 {
    let config = match ConfigLoader::load(&cli.config).await {
        Ok(config) => config,
        Err(source) => {
            let err = AppError::config("config.load", cli.config.clone(), source);
            eprintln!("error: {}", describe(&err));
            return err.exit_code();
        }
    };

    let _telemetry = match install_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {}", describe(&err));
            return err.exit_code();
        }
    };
    info!(config = %cli.config.display(), "relayarr starting");

    match relay(&cli.config, config, &environment).await {
        Ok(Some(outcome)) => outcome.exit_code(),
        Ok(None) => 0,
        Err(err) => {
            error!(error = %describe(&err), "relay aborted");
            err.exit_code()
        }
    }
}

/// Process one event; `None` means the shipped default configuration is still in place.
pub(crate) async fn relay(
    config_path: &Path,
    config: RelayConfig,
    environment: &SonarrEnvironment,
) -> AppResult<Option<EventOutcome>> {
    if config.is_default() {
        warn!(
            path = %config_path.display(),
            "Default config file detected. Please edit {}",
            config_path.display()
        );
        return Ok(None);
    }

    for (variable, value) in environment.vars() {
        debug!(variable, value, "sonarr environment");
    }
    let event = environment
        .to_event()
        .map_err(|err| AppError::ingress("environment.to_event", err))?;
    let registry = HostRegistry::from_config(&config)?;
    let orchestrator = Orchestrator::new(Arc::new(config), registry, Arc::new(LocalFilesystem));

    let outcome = orchestrator.process(&event, Uuid::new_v4()).await;
    log_outcome(&outcome);
    Ok(Some(outcome))
}

fn install_logging(cli: &Cli, config: &RelayConfig) -> AppResult<TelemetryGuard> {
    let level = cli.log_level.unwrap_or_else(|| config.logs.level());
    let directory = log_directory(&cli.config, &config.logs);
    let format = match config.logs.format {
        relayarr_config::LogFormat::Pretty => LogFormat::Pretty,
        relayarr_config::LogFormat::Json => LogFormat::Json,
    };
    init_logging(&LoggingConfig {
        level: level.as_filter(),
        format,
        file_directory: directory.as_deref(),
        build_version: env!("CARGO_PKG_VERSION"),
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))
}

/// Log file directory; relative directories resolve against the settings file location.
fn log_directory(config_path: &Path, logs: &LogConfig) -> Option<PathBuf> {
    if !logs.write_file {
        return None;
    }
    let directory = Path::new(&logs.directory);
    if directory.is_absolute() {
        return Some(directory.to_path_buf());
    }
    let base = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some(base.join(directory))
}

fn log_outcome(outcome: &EventOutcome) {
    for failure in &outcome.soft_failures {
        warn!(failure = %failure, "soft failure");
    }
    match &outcome.reason {
        Some(reason) => error!(
            event_kind = %outcome.kind,
            status = outcome.status.as_str(),
            executor = ?outcome.executor,
            error = %reason,
            "event processed"
        ),
        None => info!(
            event_kind = %outcome.kind,
            status = outcome.status.as_str(),
            executor = ?outcome.executor,
            soft_failures = outcome.soft_failures.len(),
            "event processed"
        ),
    }
}

/// Error message followed by its source chain.
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{OutcomeStatus, RelayError};
    use relayarr_test_support::fixtures::{host_config, relay_config};

    #[tokio::test]
    async fn shipped_default_stops_before_ingress() -> anyhow::Result<()> {
        let config = ConfigLoader::shipped_default()?;
        let outcome = relay(
            Path::new("settings.yaml"),
            config,
            &SonarrEnvironment::default(),
        )
        .await?;
        assert!(outcome.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn missing_event_type_exits_with_two() {
        let config = relay_config(vec![host_config("den", 0)]);
        let result = relay(
            Path::new("settings.yaml"),
            config,
            &SonarrEnvironment::default(),
        )
        .await;
        let err = result.err();
        assert!(matches!(err, Some(AppError::Ingress { .. })));
        assert_eq!(err.as_ref().map(AppError::exit_code), Some(2));
    }

    #[tokio::test]
    async fn unreachable_hosts_fail_the_event() -> anyhow::Result<()> {
        let mut host = host_config("den", 0);
        host.port = 1;
        let config = relay_config(vec![host]);
        let environment = SonarrEnvironment::from_vars([("Sonarr_EventType", "Test")]);

        let outcome = relay(Path::new("settings.yaml"), config, &environment)
            .await?
            .ok_or_else(|| anyhow::anyhow!("expected an outcome"))?;

        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert!(matches!(
            outcome.reason,
            Some(RelayError::NoAvailableHost { .. })
        ));
        assert_eq!(outcome.exit_code(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_config_exits_before_logging() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let cli = Cli {
            config: dir.path().join("missing.yaml"),
            log_level: None,
        };
        assert_eq!(run_with(cli, SonarrEnvironment::default()).await, 2);
        Ok(())
    }

    #[test]
    fn log_directory_resolves_against_config_location() {
        let mut logs = relay_config(Vec::new()).logs;
        assert_eq!(log_directory(Path::new("/etc/relayarr/settings.yaml"), &logs), None);

        logs.write_file = true;
        assert_eq!(
            log_directory(Path::new("/etc/relayarr/settings.yaml"), &logs),
            Some(PathBuf::from("/etc/relayarr/logs"))
        );
        assert_eq!(
            log_directory(Path::new("settings.yaml"), &logs),
            Some(PathBuf::from("./logs"))
        );

        logs.directory = "/var/log/relayarr".to_string();
        assert_eq!(
            log_directory(Path::new("settings.yaml"), &logs),
            Some(PathBuf::from("/var/log/relayarr"))
        );
    }

    #[test]
    fn describe_includes_source_chain() {
        let err = AppError::ingress(
            "environment.to_event",
            relayarr_events::IngressError::MissingEventType,
        );
        let message = describe(&err);
        assert!(message.starts_with("event ingress failed: "));
        assert!(message.len() > "event ingress failed: ".len());
    }
}
