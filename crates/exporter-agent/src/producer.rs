//! Metrics producers.
//!
//! A [`MetricsProducer`] is the collaborator that knows how to render the
//! current metrics. The server calls it once per scrape, possibly from several
//! worker threads at once, so implementations must be safe to call
//! concurrently.

use crate::error::ProduceError;
use bytes::Bytes;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Rendered metrics for one scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exposition {
    /// Response body
    pub body: Bytes,
    /// Value for the `Content-Type` header
    pub content_type: String,
}

impl Exposition {
    /// Create a new exposition.
    pub fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }
}

/// Capability to produce the current metrics text.
pub trait MetricsProducer: Send + Sync + 'static {
    /// Render the current metrics.
    ///
    /// # Errors
    ///
    /// Returns [`ProduceError`] if the metrics cannot be collected. The
    /// server answers that scrape with a `500`.
    fn produce(&self) -> Result<Exposition, ProduceError>;
}

impl<F> MetricsProducer for F
where
    F: Fn() -> Result<Exposition, ProduceError> + Send + Sync + 'static,
{
    fn produce(&self) -> Result<Exposition, ProduceError> {
        self()
    }
}

/// Producer backed by a prometheus [`Registry`].
///
/// Adds its own scrape bookkeeping metrics to whatever the caller registers.
pub struct RegistryProducer {
    registry: Registry,
    scrapes: IntCounter,
}

impl RegistryProducer {
    /// Create a producer over `registry`, recording `rules_file` in the
    /// `exporter_agent_info` metric.
    pub fn new(registry: Registry, rules_file: &str) -> Result<Self, prometheus::Error> {
        let scrapes = IntCounter::new(
            "exporter_agent_scrapes_total",
            "Total number of scrapes served",
        )?;
        registry.register(Box::new(scrapes.clone()))?;

        let info = IntGauge::with_opts(
            Opts::new("exporter_agent_info", "Exporter agent build and configuration")
                .const_label("version", env!("CARGO_PKG_VERSION"))
                .const_label("rules_file", rules_file),
        )?;
        info.set(1);
        registry.register(Box::new(info))?;

        Ok(Self { registry, scrapes })
    }

    /// Get the underlying registry, for registering further collectors.
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl MetricsProducer for RegistryProducer {
    fn produce(&self) -> Result<Exposition, ProduceError> {
        let started = Instant::now();
        self.scrapes.inc();

        let encoder = TextEncoder::new();
        let mut families = self.registry.gather();
        families.extend(scrape_duration(started.elapsed().as_secs_f64())?);

        let mut body = Vec::new();
        encoder.encode(&families, &mut body)?;

        Ok(Exposition::new(body, encoder.format_type()))
    }
}

/// Render a scrape's duration as its own metric family.
///
/// Built per scrape, never registered, so concurrent scrapes cannot see each
/// other's value.
fn scrape_duration(seconds: f64) -> Result<Vec<MetricFamily>, prometheus::Error> {
    let gauge = Gauge::new(
        "exporter_agent_scrape_duration_seconds",
        "Time this scrape took to render, in seconds",
    )?;
    gauge.set(seconds);
    Ok(gauge.collect())
}
