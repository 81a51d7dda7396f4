//! TLS settings document loading.
//!
//! The agent argument names a small YAML document describing whether the
//! metrics endpoint is served over HTTPS:
//!
//! ```yaml
//! serverTLSEnabled: true
//! serverKeyStorePath: /etc/agent/keystore.p12
//! serverKeyStorePassword: changeit
//! ```
//!
//! A document that enables TLS without both keystore fields, or that cannot be
//! decoded at all, is rejected. It is never treated as "TLS disabled".

use crate::error::ConfigError;
use crate::secret::SecretBytes;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Validated TLS settings for the metrics endpoint.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum TlsSettings {
    /// Serve plain HTTP.
    #[default]
    Disabled,
    /// Serve HTTPS using the given keystore.
    Enabled(KeyStoreSettings),
}

impl TlsSettings {
    /// Check if TLS is enabled.
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Keystore settings, when TLS is enabled.
    pub const fn key_store(&self) -> Option<&KeyStoreSettings> {
        match self {
            Self::Enabled(key_store) => Some(key_store),
            Self::Disabled => None,
        }
    }
}

/// Location and password of a PKCS#12 keystore holding the server identity.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyStoreSettings {
    /// Keystore path, exactly as written in the settings document
    pub path: PathBuf,
    /// Keystore password
    pub password: SecretBytes,
}

/// Raw shape of the settings document. Unknown keys are ignored.
#[derive(Deserialize, Default)]
struct TlsDocument {
    #[serde(rename = "serverTLSEnabled", default)]
    enabled: bool,
    #[serde(rename = "serverKeyStorePath", default)]
    key_store_path: Option<String>,
    #[serde(rename = "serverKeyStorePassword", default)]
    key_store_password: Option<SecretBytes>,
}

/// Load and validate the TLS settings document at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] if the file does not exist and
/// [`ConfigError::InvalidTls`] if it cannot be read or decoded, or enables
/// TLS without a keystore path and password.
pub fn load(path: &Path) -> Result<TlsSettings, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::InvalidTls {
                path: path.to_path_buf(),
                reason: source.to_string(),
            }
        }
    })?;

    let settings = parse(&contents).map_err(|reason| ConfigError::InvalidTls {
        path: path.to_path_buf(),
        reason,
    })?;

    tracing::debug!(
        path = %path.display(),
        tls_enabled = settings.is_enabled(),
        "Loaded TLS settings"
    );

    Ok(settings)
}

fn parse(contents: &str) -> Result<TlsSettings, String> {
    // An empty document carries no keys; every key has a default.
    let document = if contents.trim().is_empty() {
        TlsDocument::default()
    } else {
        serde_yaml::from_str::<TlsDocument>(contents).map_err(|e| e.to_string())?
    };

    if !document.enabled {
        if document.key_store_path.is_some() || document.key_store_password.is_some() {
            tracing::debug!("Keystore settings present but TLS is disabled; ignoring them");
        }
        return Ok(TlsSettings::Disabled);
    }

    let path = match document.key_store_path {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => {
            return Err(
                "serverTLSEnabled is true but serverKeyStorePath is missing or empty".to_string(),
            );
        }
    };

    let password = match document.key_store_password {
        Some(password) if !password.is_empty() => password,
        _ => {
            return Err(
                "serverTLSEnabled is true but serverKeyStorePassword is missing or empty"
                    .to_string(),
            );
        }
    };

    Ok(TlsSettings::Enabled(KeyStoreSettings { path, password }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_tls_disabled_by_default() {
        let file = settings_file("someOtherKey: 1\n");
        let settings = load(file.path()).unwrap();
        assert_eq!(settings, TlsSettings::Disabled);
    }

    #[test]
    fn test_empty_document_is_disabled() {
        let file = settings_file("");
        assert_eq!(load(file.path()).unwrap(), TlsSettings::Disabled);
    }

    #[test]
    fn test_explicitly_disabled_ignores_keystore() {
        let file = settings_file(
            "serverTLSEnabled: false\nserverKeyStorePath: /tmp/ks.p12\nserverKeyStorePassword: secret\n",
        );
        assert_eq!(load(file.path()).unwrap(), TlsSettings::Disabled);
    }

    #[test]
    fn test_tls_enabled() {
        let file = settings_file(
            "serverTLSEnabled: true\nserverKeyStorePath: /tmp/ks.p12\nserverKeyStorePassword: secret\n",
        );
        let settings = load(file.path()).unwrap();
        assert!(settings.is_enabled());

        let key_store = settings.key_store().unwrap();
        assert_eq!(key_store.path, PathBuf::from("/tmp/ks.p12"));
        assert_eq!(key_store.password.expose(), b"secret");
    }

    #[test]
    fn test_enabled_without_password_is_rejected() {
        let file = settings_file("serverTLSEnabled: true\nserverKeyStorePath: /tmp/ks.p12\n");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTls { .. }));
        assert!(err.to_string().contains("serverKeyStorePassword"));
    }

    #[test]
    fn test_enabled_without_path_is_rejected() {
        let file = settings_file("serverTLSEnabled: true\nserverKeyStorePassword: secret\n");
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("serverKeyStorePath"));
    }

    #[test]
    fn test_enabled_with_empty_fields_is_rejected() {
        let file = settings_file(
            "serverTLSEnabled: true\nserverKeyStorePath: \"\"\nserverKeyStorePassword: \"\"\n",
        );
        assert!(matches!(
            load(file.path()),
            Err(ConfigError::InvalidTls { .. })
        ));
    }

    #[test]
    fn test_undecodable_document_is_rejected() {
        let file = settings_file("serverTLSEnabled: [true\n");
        assert!(matches!(
            load(file.path()),
            Err(ConfigError::InvalidTls { .. })
        ));
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let file = settings_file("serverTLSEnabled: maybe\n");
        assert!(matches!(
            load(file.path()),
            Err(ConfigError::InvalidTls { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load(Path::new("/nonexistent/tls-settings.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_password_never_in_error() {
        let file = settings_file("serverTLSEnabled: true\nserverKeyStorePassword: topsecret\n");
        let err = load(file.path()).unwrap_err();
        assert!(!err.to_string().contains("topsecret"));
        assert!(!format!("{err:?}").contains("topsecret"));
    }
}
