//! Metrics server construction and lifecycle.
//!
//! [`MetricsServer::create`] prepares the endpoint: it loads keystore
//! material when TLS is enabled, so a broken keystore fails before any socket
//! exists. [`MetricsServer::start`] binds and begins serving, and
//! [`MetricsServer::stop`] shuts down within a bounded grace window.

use crate::args::ResolvedConfig;
use crate::error::ServerError;
use crate::http;
use crate::keystore;
use crate::lifecycle::LifecycleState;
use crate::producer::MetricsProducer;
use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A metrics endpoint, plain or TLS.
pub struct MetricsServer {
    config: ResolvedConfig,
    router: Router,
    tls: Option<RustlsConfig>,
    handle: Handle,
    state: LifecycleState,
    local_addr: Option<SocketAddr>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl MetricsServer {
    /// Create a metrics server for `config`, serving what `producer` renders.
    ///
    /// The server is inert until [`start`](Self::start) is called.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::TlsBootstrap`] if TLS is enabled and the
    /// keystore cannot be opened or decrypted. There is no fallback to
    /// plain HTTP.
    pub fn create(
        config: ResolvedConfig,
        producer: Arc<dyn MetricsProducer>,
    ) -> Result<Self, ServerError> {
        let tls = match config.tls.key_store() {
            Some(key_store) => Some(RustlsConfig::from_config(
                keystore::load_server_config(key_store)?,
            )),
            None => None,
        };

        if tls.is_some() {
            tracing::info!("TLS enabled for metrics endpoint");
        } else {
            tracing::info!("TLS disabled (HTTP only)");
        }

        Ok(Self {
            config,
            router: http::create_router(producer),
            tls,
            handle: Handle::new(),
            state: LifecycleState::Created,
            local_addr: None,
            task: None,
        })
    }

    /// Bind the listener and start serving.
    ///
    /// Must be called from within a Tokio runtime. Returns the bound address,
    /// which differs from the configured one when the port is `0`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Lifecycle`] if the server was already started,
    /// and [`ServerError::AddressResolution`] or [`ServerError::Bind`] if the
    /// socket cannot be set up. A failed bind leaves the server in `Created`.
    pub fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let bound = self.state.transition(LifecycleState::Bound)?;

        let addr = self.bind_addr()?;
        let listener = bind_listener(addr)?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.state = bound;
        self.local_addr = Some(local_addr);

        let app = self.router.clone().into_make_service();
        let handle = self.handle.clone();
        let task = match &self.tls {
            Some(tls) => tokio::spawn(
                axum_server::from_tcp_rustls(listener, tls.clone())
                    .handle(handle)
                    .serve(app),
            ),
            None => tokio::spawn(axum_server::from_tcp(listener).handle(handle).serve(app)),
        };
        self.task = Some(task);
        self.state = self.state.transition(LifecycleState::Serving)?;

        tracing::info!(
            addr = %local_addr,
            scheme = self.scheme(),
            path = http::METRICS_PATH,
            "Metrics server listening"
        );

        Ok(local_addr)
    }

    /// Stop serving.
    ///
    /// New connections are refused immediately, in-flight requests get up to
    /// `grace` to finish, then remaining connections are closed.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Lifecycle`] unless the server is serving, and
    /// [`ServerError::Serve`] if the serving task ended with an error.
    pub async fn stop(&mut self, grace: Duration) -> Result<(), ServerError> {
        self.state = self.state.transition(LifecycleState::Stopped)?;

        tracing::info!(
            grace_ms = grace.as_millis(),
            connections = self.connection_count(),
            "Stopping metrics server"
        );
        self.handle.graceful_shutdown(Some(grace));

        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| ServerError::Serve(e.to_string()))?
                .map_err(|e| ServerError::Serve(e.to_string()))?;
        }

        tracing::info!("Metrics server stopped");
        Ok(())
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Bound address, once started.
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Configuration the server was created with.
    pub const fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Check if the endpoint serves HTTPS.
    pub const fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }

    const fn scheme(&self) -> &'static str {
        if self.is_tls() { "https" } else { "http" }
    }

    fn bind_addr(&self) -> Result<SocketAddr, ServerError> {
        let host = self.config.bind_host();
        let port = self.config.port;
        let resolution_error = |source| ServerError::AddressResolution {
            host: self.config.host.clone(),
            port,
            source,
        };

        (host, port)
            .to_socket_addrs()
            .map_err(resolution_error)?
            .next()
            .ok_or_else(|| {
                resolution_error(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "host resolved to no addresses",
                ))
            })
    }
}

impl Drop for MetricsServer {
    fn drop(&mut self) {
        if self.state == LifecycleState::Serving {
            self.handle.shutdown();
        }
    }
}

fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::Bind { addr, source })?;
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LifecycleError, ProduceError};
    use crate::producer::Exposition;
    use crate::secret::SecretBytes;
    use crate::tls::{KeyStoreSettings, TlsSettings};
    use std::path::PathBuf;

    fn config(tls: TlsSettings) -> ResolvedConfig {
        ResolvedConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            rules_file: "config.yaml".to_string(),
            tls,
        }
    }

    fn producer() -> Arc<dyn MetricsProducer> {
        Arc::new(|| -> Result<Exposition, ProduceError> {
            Ok(Exposition::new("up 1\n", "text/plain"))
        })
    }

    fn keystore(password: &str) -> TlsSettings {
        TlsSettings::Enabled(KeyStoreSettings {
            path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keystore.p12"),
            password: SecretBytes::from(password.to_string()),
        })
    }

    #[test]
    fn test_create_is_inert() {
        let server = MetricsServer::create(config(TlsSettings::Disabled), producer()).unwrap();
        assert_eq!(server.state(), LifecycleState::Created);
        assert_eq!(server.local_addr(), None);
        assert_eq!(server.config().host, "127.0.0.1");
        assert_eq!(server.connection_count(), 0);
        assert!(!server.is_tls());
    }

    #[test]
    fn test_create_with_tls() {
        let server = MetricsServer::create(config(keystore("ykOUaInleG/fqTPi")), producer())
            .unwrap();
        assert!(server.is_tls());
        assert_eq!(server.state(), LifecycleState::Created);
    }

    #[test]
    fn test_create_with_wrong_password() {
        let result = MetricsServer::create(config(keystore("wrong")), producer());
        assert!(matches!(result, Err(ServerError::TlsBootstrap(_))));
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let mut server = MetricsServer::create(config(TlsSettings::Disabled), producer()).unwrap();

        let addr = server.start().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(server.state(), LifecycleState::Serving);
        assert_eq!(server.local_addr(), Some(addr));

        server.stop(Duration::from_millis(100)).await.unwrap();
        assert_eq!(server.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_start_twice() {
        let mut server = MetricsServer::create(config(TlsSettings::Disabled), producer()).unwrap();
        server.start().unwrap();

        let err = server.start().unwrap_err();
        assert!(matches!(
            err,
            ServerError::Lifecycle(LifecycleError::InvalidTransition {
                from: LifecycleState::Serving,
                to: LifecycleState::Bound,
            })
        ));

        server.stop(Duration::from_millis(100)).await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let mut server = MetricsServer::create(config(TlsSettings::Disabled), producer()).unwrap();
        let err = server.stop(Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, ServerError::Lifecycle(_)));
        assert_eq!(server.state(), LifecycleState::Created);
    }

    #[tokio::test]
    async fn test_stop_twice() {
        let mut server = MetricsServer::create(config(TlsSettings::Disabled), producer()).unwrap();
        server.start().unwrap();
        server.stop(Duration::from_millis(100)).await.unwrap();

        assert!(server.stop(Duration::from_millis(100)).await.is_err());
        assert!(server.start().is_err());
    }

    #[tokio::test]
    async fn test_bind_failure_leaves_created() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let mut cfg = config(TlsSettings::Disabled);
        cfg.port = port;
        let mut server = MetricsServer::create(cfg, producer()).unwrap();

        assert!(matches!(server.start(), Err(ServerError::Bind { .. })));
        assert_eq!(server.state(), LifecycleState::Created);
    }

    #[test]
    fn test_unresolvable_host() {
        let mut cfg = config(TlsSettings::Disabled);
        cfg.host = "host.invalid".to_string();
        let server = MetricsServer::create(cfg, producer()).unwrap();

        assert!(matches!(
            server.bind_addr(),
            Err(ServerError::AddressResolution { .. })
        ));
    }
}
