//! HTTP/HTTPS routing using axum.

use crate::producer::MetricsProducer;
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;

/// Path of the single metrics route.
pub const METRICS_PATH: &str = "/metrics";

/// Create the HTTP router. It serves exactly one route, `GET /metrics`.
pub fn create_router(producer: Arc<dyn MetricsProducer>) -> Router {
    Router::new()
        .route(METRICS_PATH, axum::routing::get(handlers::handle_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(producer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProduceError;
    use crate::producer::Exposition;

    #[test]
    fn test_router_creation() {
        let producer = || -> Result<Exposition, ProduceError> {
            Ok(Exposition::new("up 1\n", "text/plain"))
        };
        let _router = create_router(Arc::new(producer));
    }
}
