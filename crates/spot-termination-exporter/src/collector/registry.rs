//! Process-owned Prometheus registry

use prometheus::{Encoder, Registry, TextEncoder};

use super::TerminationCollector;
use crate::error::{ExporterError, Result};

/// Registry holding the termination collector (and process metrics on Linux)
#[derive(Clone)]
pub struct ExporterRegistry {
    registry: Registry,
}

impl ExporterRegistry {
    /// Create a registry and register `collector` into it
    pub fn new(collector: TerminationCollector) -> Result<Self> {
        let registry = Registry::new();
        registry.register(Box::new(collector))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self { registry })
    }

    /// Gather all metrics; blocks while the metadata service is probed
    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ExporterError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}
