//! PKCS#12 keystore loading.
//!
//! Opens the password-protected keystore named by the TLS settings and turns
//! its first private key entry into a rustls server configuration. The
//! configuration carries only the server identity; clients are not asked for
//! certificates.

use crate::error::TlsBootstrapError;
use crate::tls::KeyStoreSettings;
use p12_keystore::KeyStore;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::sync::Arc;

/// Build a rustls server configuration from a PKCS#12 keystore.
///
/// # Errors
///
/// Returns [`TlsBootstrapError`] if the keystore cannot be read, decrypted,
/// holds no key with a certificate chain, or rustls rejects the material.
pub fn load_server_config(
    settings: &KeyStoreSettings,
) -> Result<Arc<rustls::ServerConfig>, TlsBootstrapError> {
    let data = std::fs::read(&settings.path).map_err(|source| TlsBootstrapError::Read {
        path: settings.path.clone(),
        source,
    })?;

    let password = settings
        .password
        .expose_str()
        .ok_or(TlsBootstrapError::PasswordEncoding)?;

    let key_store =
        KeyStore::from_pkcs12(&data, password).map_err(|e| TlsBootstrapError::KeyStore {
            path: settings.path.clone(),
            reason: e.to_string(),
        })?;

    let (alias, chain) =
        key_store
            .private_key_chain()
            .ok_or_else(|| TlsBootstrapError::MissingIdentity {
                path: settings.path.clone(),
            })?;

    let certs: Vec<CertificateDer<'static>> = chain
        .chain()
        .iter()
        .map(|cert| CertificateDer::from(cert.as_der().to_vec()))
        .collect();
    if certs.is_empty() {
        return Err(TlsBootstrapError::MissingIdentity {
            path: settings.path.clone(),
        });
    }

    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(chain.key().to_vec()));

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    tracing::info!(
        path = %settings.path.display(),
        alias,
        chain_len = chain.chain().len(),
        "Loaded server identity from keystore"
    );

    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::SecretBytes;
    use std::path::PathBuf;

    const FIXTURE_PASSWORD: &str = "ykOUaInleG/fqTPi";

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keystore.p12")
    }

    fn settings(path: PathBuf, password: &str) -> KeyStoreSettings {
        KeyStoreSettings {
            path,
            password: SecretBytes::from(password.to_string()),
        }
    }

    #[test]
    fn test_load_fixture() {
        let config = load_server_config(&settings(fixture(), FIXTURE_PASSWORD)).unwrap();
        assert_eq!(config.alpn_protocols.len(), 2);
    }

    #[test]
    fn test_wrong_password() {
        let err = load_server_config(&settings(fixture(), "not-the-password")).unwrap_err();
        assert!(matches!(err, TlsBootstrapError::KeyStore { .. }));
    }

    #[test]
    fn test_missing_keystore() {
        let err = load_server_config(&settings(
            PathBuf::from("/nonexistent/keystore.p12"),
            FIXTURE_PASSWORD,
        ))
        .unwrap_err();
        assert!(matches!(err, TlsBootstrapError::Read { .. }));
    }

    #[test]
    fn test_not_a_keystore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.p12");
        std::fs::write(&path, b"definitely not pkcs12").unwrap();

        let err = load_server_config(&settings(path, FIXTURE_PASSWORD)).unwrap_err();
        assert!(matches!(err, TlsBootstrapError::KeyStore { .. }));
    }

    #[test]
    fn test_non_utf8_password() {
        let settings = KeyStoreSettings {
            path: fixture(),
            password: SecretBytes::new(vec![0xff, 0xfe]),
        };
        assert!(matches!(
            load_server_config(&settings),
            Err(TlsBootstrapError::PasswordEncoding)
        ));
    }
}
