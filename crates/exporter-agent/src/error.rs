//! Error types for the exporter agent.
//!
//! Every bootstrap error is fatal: the agent refuses to start rather than
//! serving metrics under a misparsed binding or with broken TLS.

use crate::lifecycle::LifecycleState;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing the raw invocation argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// The argument does not match the invocation grammar at all.
    #[error("Malformed agent argument: {0}")]
    Malformed(String),

    /// The argument could be read more than one way and is rejected.
    #[error("Ambiguous host/port in agent argument: {0}")]
    AmbiguousHostPort(String),
}

/// Errors raised while locating or reading the TLS settings document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TLS settings document does not exist.
    #[error("TLS settings file not found: {}", path.display())]
    FileNotFound {
        /// Path as given in the agent argument
        path: PathBuf,
    },

    /// The TLS settings document exists but is undecodable or inconsistent.
    #[error("Invalid TLS settings in {}: {reason}", path.display())]
    InvalidTls {
        /// Path of the offending document
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },
}

/// Errors raised while turning keystore material into a TLS server identity.
#[derive(Debug, Error)]
pub enum TlsBootstrapError {
    /// The keystore file could not be read.
    #[error("Failed to read keystore {}: {source}", path.display())]
    Read {
        /// Keystore path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The keystore could not be decoded or decrypted (wrong password, corrupt file).
    #[error("Failed to open keystore {}: {reason}", path.display())]
    KeyStore {
        /// Keystore path
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// The keystore holds no private key with a certificate chain.
    #[error("Keystore {} contains no private key entry with a certificate chain", path.display())]
    MissingIdentity {
        /// Keystore path
        path: PathBuf,
    },

    /// The keystore password is not valid UTF-8.
    #[error("Keystore password is not valid UTF-8")]
    PasswordEncoding,

    /// rustls rejected the certificate chain or key.
    #[error("Failed to build TLS server context: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Misuse of the server lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// The requested transition is not allowed from the current state.
    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        /// State the server was in
        from: LifecycleState,
        /// State that was requested
        to: LifecycleState,
    },
}

/// Errors raised while resolving the agent argument into a configuration.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Agent argument error
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// TLS settings error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Server bootstrap and runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Keystore error
    #[error(transparent)]
    TlsBootstrap(#[from] TlsBootstrapError),

    /// Lifecycle misuse
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The configured host could not be resolved to a socket address.
    #[error("Failed to resolve bind address {host}:{port}: {source}")]
    AddressResolution {
        /// Host as configured
        host: String,
        /// Port as configured
        port: u16,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Failed to bind the metrics listener
    #[error("Failed to bind metrics server to {addr}: {source}")]
    Bind {
        /// Address that failed to bind
        addr: std::net::SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The serving task ended abnormally.
    #[error("Metrics server error: {0}")]
    Serve(String),
}

/// Error raised by a metrics producer for a single scrape.
#[derive(Debug, Error)]
#[error("Metrics producer failed: {0}")]
pub struct ProduceError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl ProduceError {
    /// Wrap any error (or message) raised while producing metrics.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

impl From<prometheus::Error> for ProduceError {
    fn from(err: prometheus::Error) -> Self {
        Self::new(err)
    }
}
