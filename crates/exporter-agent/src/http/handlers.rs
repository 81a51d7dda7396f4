//! HTTP request handlers.

use crate::error::ProduceError;
use crate::producer::MetricsProducer;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Handle GET /metrics.
///
/// Runs the producer on the blocking pool and returns its body with its
/// content type.
///
/// # Errors
///
/// Returns `AppError` if the producer fails, panics, or reports a content
/// type that is not a valid header value.
pub async fn handle_metrics(
    State(producer): State<Arc<dyn MetricsProducer>>,
) -> Result<Response, AppError> {
    let exposition = tokio::task::spawn_blocking(move || producer.produce())
        .await
        .map_err(|e| AppError::Worker(e.to_string()))??;

    let content_type = HeaderValue::from_str(&exposition.content_type)
        .map_err(|_| AppError::InvalidContentType(exposition.content_type.clone()))?;

    tracing::debug!(bytes = exposition.body.len(), "Served metrics scrape");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        exposition.body,
    )
        .into_response())
}

/// Application-level error type for HTTP handlers. Every variant is a 500.
#[derive(Debug)]
pub enum AppError {
    /// The producer returned an error
    Producer(ProduceError),
    /// The producer task panicked or was cancelled
    Worker(String),
    /// The producer returned an unusable content type
    InvalidContentType(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Producer(err) => err.to_string(),
            Self::Worker(msg) => format!("Metrics producer task failed: {msg}"),
            Self::InvalidContentType(value) => {
                format!("Metrics producer returned an invalid content type: {value:?}")
            }
        };
        tracing::error!(error = %message, "Metrics scrape failed");

        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

impl From<ProduceError> for AppError {
    fn from(err: ProduceError) -> Self {
        Self::Producer(err)
    }
}
