//! Agent argument resolution.
//!
//! The agent receives a single opaque argument:
//!
//! ```text
//! [host:]port:rules-file,tls-settings-file
//! ```
//!
//! The argument is split on its first comma. The left half is parsed by
//! [`grammar`], the right half names the TLS settings document loaded by
//! [`crate::tls::load`].
//!
//! # Example
//!
//! ```no_run
//! use exporter_agent::args::resolve;
//!
//! let config = resolve("9404:C:\\agent\\rules.yaml,C:\\agent\\tls.yaml", "0.0.0.0")?;
//! assert_eq!(config.port, 9404);
//! assert_eq!(config.rules_file, "C:\\agent\\rules.yaml");
//! # Ok::<(), exporter_agent::ResolveError>(())
//! ```

pub mod grammar;

use crate::error::{ArgumentError, ConfigError, ResolveError};
use crate::tls::{self, TlsSettings};
use std::path::Path;

/// Fully resolved agent configuration. Immutable once built.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Bind host; IPv6 literals keep their brackets
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Metrics rules file, exactly as it appeared in the argument
    pub rules_file: String,
    /// TLS settings for the endpoint
    pub tls: TlsSettings,
}

impl ResolvedConfig {
    /// Rules file as a path.
    pub fn rules_file_path(&self) -> &Path {
        Path::new(&self.rules_file)
    }

    /// Host with IPv6 brackets removed, suitable for socket address lookup.
    pub fn bind_host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|host| host.strip_suffix(']'))
            .unwrap_or(&self.host)
    }
}

/// Resolve the raw agent argument.
///
/// `default_host` is used when the argument names no host.
///
/// # Errors
///
/// - [`ArgumentError::Malformed`] when the argument does not match the grammar
/// - [`ArgumentError::AmbiguousHostPort`] when host and port cannot be told apart
/// - [`ConfigError::FileNotFound`] when the TLS settings file does not exist
/// - [`ConfigError::InvalidTls`] when the TLS settings are undecodable or inconsistent
pub fn resolve(raw: &str, default_host: &str) -> Result<ResolvedConfig, ResolveError> {
    let (conn_spec, tls_settings_path) = match raw.split_once(',') {
        Some((conn_spec, path)) => (conn_spec, Some(path)),
        None => (raw, None),
    };

    // The connection spec is checked first so that a bad host/port is
    // reported even when the TLS settings path is missing.
    let spec = grammar::parse(conn_spec)?;

    let tls_settings_path = tls_settings_path
        .filter(|path| !path.is_empty())
        .ok_or_else(|| {
            ArgumentError::Malformed(format!(
                "missing TLS settings file in '{raw}', expected [host:]port:file,tls-settings-file"
            ))
        })?;

    let host = match spec.host {
        Some(host) => host,
        None if default_host.is_empty() => {
            return Err(ArgumentError::Malformed(
                "no host given and the default host is empty".to_string(),
            )
            .into());
        }
        None => default_host,
    };

    let tls_settings_path = Path::new(tls_settings_path);
    if !tls_settings_path.is_file() {
        return Err(ConfigError::FileNotFound {
            path: tls_settings_path.to_path_buf(),
        }
        .into());
    }
    let tls = tls::load(tls_settings_path)?;

    tracing::info!(
        host,
        port = spec.port,
        rules_file = spec.file,
        tls_enabled = tls.is_enabled(),
        "Resolved agent argument"
    );

    Ok(ResolvedConfig {
        host: host.to_string(),
        port: spec.port,
        rules_file: spec.file.to_string(),
        tls,
    })
}
