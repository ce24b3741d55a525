// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics for the ingestion/retrieval core. Counters and
//! histograms are namespaced `kernel_memory_*`; `render()` returns the
//! text-exposition payload a `/metrics` HTTP route can serve directly.

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

#[derive(Clone)]
pub struct KmMetrics {
    registry: Arc<Registry>,

    pub documents_admitted_total: IntCounter,
    pub steps_completed_total: IntCounterVec,
    pub steps_failed_total: IntCounterVec,
    pub step_duration_seconds: Histogram,
    pub documents_active: IntGauge,

    pub search_requests_total: IntCounter,
    pub ask_requests_total: IntCounter,
    pub ask_no_answer_total: IntCounter,
}

impl KmMetrics {
    pub fn new() -> Result<Self, KmError> {
        let registry = Registry::new();

        let documents_admitted_total = IntCounter::with_opts(Opts::new("documents_admitted_total", "Total documents admitted for ingestion").namespace("kernel_memory"))
            .map_err(|e| KmError::internal(format!("failed to create documents_admitted_total: {e}")))?;

        let steps_completed_total = IntCounterVec::new(
            Opts::new("steps_completed_total", "Pipeline steps completed, by step name").namespace("kernel_memory"),
            &["step"],
        )
        .map_err(|e| KmError::internal(format!("failed to create steps_completed_total: {e}")))?;

        let steps_failed_total = IntCounterVec::new(
            Opts::new("steps_failed_total", "Pipeline steps that errored, by step name").namespace("kernel_memory"),
            &["step"],
        )
        .map_err(|e| KmError::internal(format!("failed to create steps_failed_total: {e}")))?;

        let step_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("step_duration_seconds", "Time spent executing a single pipeline step")
                .namespace("kernel_memory")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )
        .map_err(|e| KmError::internal(format!("failed to create step_duration_seconds: {e}")))?;

        let documents_active = IntGauge::with_opts(Opts::new("documents_active", "Documents currently mid-pipeline").namespace("kernel_memory"))
            .map_err(|e| KmError::internal(format!("failed to create documents_active: {e}")))?;

        let search_requests_total = IntCounter::with_opts(Opts::new("search_requests_total", "Total search requests served").namespace("kernel_memory"))
            .map_err(|e| KmError::internal(format!("failed to create search_requests_total: {e}")))?;

        let ask_requests_total = IntCounter::with_opts(Opts::new("ask_requests_total", "Total ask requests served").namespace("kernel_memory"))
            .map_err(|e| KmError::internal(format!("failed to create ask_requests_total: {e}")))?;

        let ask_no_answer_total = IntCounter::with_opts(Opts::new("ask_no_answer_total", "Ask requests answered with the no-answer fallback").namespace("kernel_memory"))
            .map_err(|e| KmError::internal(format!("failed to create ask_no_answer_total: {e}")))?;

        registry.register(Box::new(documents_admitted_total.clone())).map_err(|e| KmError::internal(e.to_string()))?;
        registry.register(Box::new(steps_completed_total.clone())).map_err(|e| KmError::internal(e.to_string()))?;
        registry.register(Box::new(steps_failed_total.clone())).map_err(|e| KmError::internal(e.to_string()))?;
        registry.register(Box::new(step_duration_seconds.clone())).map_err(|e| KmError::internal(e.to_string()))?;
        registry.register(Box::new(documents_active.clone())).map_err(|e| KmError::internal(e.to_string()))?;
        registry.register(Box::new(search_requests_total.clone())).map_err(|e| KmError::internal(e.to_string()))?;
        registry.register(Box::new(ask_requests_total.clone())).map_err(|e| KmError::internal(e.to_string()))?;
        registry.register(Box::new(ask_no_answer_total.clone())).map_err(|e| KmError::internal(e.to_string()))?;

        Ok(Self {
            registry: Arc::new(registry),
            documents_admitted_total,
            steps_completed_total,
            steps_failed_total,
            step_duration_seconds,
            documents_active,
            search_requests_total,
            ask_requests_total,
            ask_no_answer_total,
        })
    }

    /// Renders every registered metric in Prometheus text-exposition format.
    pub fn render(&self) -> Result<String, KmError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer).map_err(|e| KmError::internal(format!("failed to encode metrics: {e}")))?;
        String::from_utf8(buffer).map_err(|e| KmError::internal(format!("metrics output is not valid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_names() {
        let metrics = KmMetrics::new().unwrap();
        metrics.documents_admitted_total.inc();
        let output = metrics.render().unwrap();
        assert!(output.contains("kernel_memory_documents_admitted_total"));
    }
}
