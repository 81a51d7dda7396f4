//! Exporter agent bootstrap.
//!
//! This crate turns a single agent argument into a running metrics endpoint:
//!
//! ```text
//! [host:]port:rules-file,tls-settings-file
//! ```
//!
//! # Architecture
//!
//! - `args`: argument resolution (host, port, rules file, TLS settings path)
//! - `tls`: TLS settings document loading and validation
//! - `keystore`: PKCS#12 keystore to rustls server identity
//! - `producer`: the metrics producing capability
//! - `http`: the `GET /metrics` route
//! - `server`: endpoint construction and lifecycle
//! - `config`: binary CLI configuration
//!
//! # Example
//!
//! ```no_run
//! use exporter_agent::{MetricsServer, RegistryProducer, resolve};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = resolve("9404:rules.yaml,tls.yaml", "0.0.0.0")?;
//!     let producer = RegistryProducer::new(prometheus::Registry::new(), &config.rules_file)?;
//!
//!     let mut server = MetricsServer::create(config, Arc::new(producer))?;
//!     server.start()?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.stop(Duration::from_secs(5)).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod keystore;
pub mod lifecycle;
pub mod producer;
pub mod secret;
pub mod server;
pub mod tls;

pub use args::{ResolvedConfig, resolve};
pub use config::{AgentConfig, LogFormat};
pub use error::{
    ArgumentError, ConfigError, LifecycleError, ProduceError, ResolveError, ServerError,
    TlsBootstrapError,
};
pub use lifecycle::LifecycleState;
pub use producer::{Exposition, MetricsProducer, RegistryProducer};
pub use secret::SecretBytes;
pub use server::MetricsServer;
pub use tls::{KeyStoreSettings, TlsSettings};
