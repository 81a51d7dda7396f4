//! Exporter agent binary entry point.
//!
//! This is a thin wrapper around the exporter-agent library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Resolves the agent argument and TLS settings
//! 4. Serves metrics until interrupted
//!
//! Any bootstrap failure exits non-zero before a listener is bound.

use anyhow::Result;
use exporter_agent::{AgentConfig, LogFormat, MetricsServer, RegistryProducer, resolve};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AgentConfig::from_args();

    init_tracing(config.log_format);

    tracing::info!("Exporter agent starting...");

    let resolved = resolve(&config.argument, &config.default_host)?;
    let producer = RegistryProducer::new(prometheus::Registry::new(), &resolved.rules_file)?;

    let mut server = MetricsServer::create(resolved, Arc::new(producer))?;
    server.start()?;
    tracing::info!(
        rules_file = %server.config().rules_file_path().display(),
        "Exporter agent ready"
    );

    shutdown_signal().await?;
    tracing::info!("Shutdown signal received, stopping server");

    server.stop(config.shutdown_grace()).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
