//! Command-line arguments of the relay binary.

use std::path::PathBuf;

use clap::Parser;
use relayarr_config::LogLevel;
use relayarr_config::defaults::DEFAULT_CONFIG_PATH;

/// Relay one Sonarr custom-script event to the configured Kodi hosts.
///
/// Event data is read from the `Sonarr_*` environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "relayarr", version, about)]
pub struct Cli {
    /// Settings file.
    #[arg(long, env = "RELAYARR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
    /// Override the configured log level (DEBUG, INFO, WARNING, CRITICAL).
    #[arg(long, value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::parse(value)
        .ok_or_else(|| format!("expected one of {}", LogLevel::NAMES.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_override_is_case_insensitive() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "relayarr",
            "--config",
            "/etc/relayarr/settings.yaml",
            "--log-level",
            "warning",
        ])?;
        assert_eq!(cli.config, PathBuf::from("/etc/relayarr/settings.yaml"));
        assert_eq!(cli.log_level, Some(LogLevel::Warning));
        Ok(())
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let parsed = Cli::try_parse_from(["relayarr", "--log-level", "verbose"]);
        assert!(parsed.is_err());
    }
}
