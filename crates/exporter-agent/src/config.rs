//! Binary configuration.
//!
//! The agent argument itself carries host, port, rules file and TLS settings
//! path. The remaining knobs come from CLI flags or environment variables:
//!
//! - `--default-host` / `EXPORTER_AGENT_DEFAULT_HOST`
//! - `--shutdown-grace` / `EXPORTER_AGENT_SHUTDOWN_GRACE`
//! - `--log-format` / `EXPORTER_AGENT_LOG_FORMAT`
//!
//! # Example
//!
//! ```no_run
//! use exporter_agent::AgentConfig;
//!
//! let config = AgentConfig::from_args();
//! println!("Default host: {}", config.default_host);
//! println!("Grace window: {:?}", config.shutdown_grace());
//! ```

use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Agent configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "exporter-agent",
    about = "Serve metrics over HTTP(S) from a single agent argument",
    version
)]
pub struct AgentConfig {
    /// Agent argument: [host:]port:rules-file,tls-settings-file
    #[arg(env = "EXPORTER_AGENT_ARGUMENT")]
    pub argument: String,

    /// Host to bind when the agent argument names none
    #[arg(long, env = "EXPORTER_AGENT_DEFAULT_HOST", default_value = "0.0.0.0")]
    pub default_host: String,

    /// Seconds in-flight scrapes get to finish on shutdown
    #[arg(long, env = "EXPORTER_AGENT_SHUTDOWN_GRACE", default_value_t = 5)]
    pub shutdown_grace: u64,

    /// Log output format
    #[arg(
        long,
        value_enum,
        env = "EXPORTER_AGENT_LOG_FORMAT",
        default_value = "text"
    )]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl AgentConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Shutdown grace window.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config =
            AgentConfig::try_parse_from(["exporter-agent", "9404:rules.yaml,tls.yaml"]).unwrap();
        assert_eq!(config.argument, "9404:rules.yaml,tls.yaml");
        assert_eq!(config.default_host, "0.0.0.0");
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_flags() {
        let config = AgentConfig::try_parse_from([
            "exporter-agent",
            "--default-host",
            "127.0.0.1",
            "--shutdown-grace",
            "1",
            "--log-format",
            "json",
            "C:\\agent\\rules.yaml,C:\\agent\\tls.yaml",
        ])
        .unwrap();
        assert_eq!(config.default_host, "127.0.0.1");
        assert_eq!(config.shutdown_grace(), Duration::from_secs(1));
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
