//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    LOG_FINALIZE_FAILURES_TOTAL, RENDER_FAILURES_TOTAL, SENDS_TOTAL, SEND_DURATION,
    TEMPLATE_FALLBACKS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording send pipeline metrics
pub struct SendMetrics;

impl SendMetrics {
    /// Record a delivered email
    pub fn record_sent(duration_secs: f64) {
        SENDS_TOTAL.with_label_values(&["sent"]).inc();
        SEND_DURATION.observe(duration_secs);
    }

    /// Record a transport failure
    pub fn record_failed(duration_secs: f64) {
        SENDS_TOTAL.with_label_values(&["failed"]).inc();
        SEND_DURATION.observe(duration_secs);
    }

    /// Record a send aborted before reaching the transport
    pub fn record_rejected() {
        SENDS_TOTAL.with_label_values(&["rejected"]).inc();
    }

    pub fn record_render_failure() {
        RENDER_FAILURES_TOTAL.inc();
    }

    pub fn record_fallback() {
        TEMPLATE_FALLBACKS_TOTAL.inc();
    }

    pub fn record_finalize_failure() {
        LOG_FINALIZE_FAILURES_TOTAL.inc();
    }
}
