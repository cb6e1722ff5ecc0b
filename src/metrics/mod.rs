//! Prometheus metrics for the email notification service.
//!
//! - Send outcomes and duration
//! - Render failures and language fallbacks
//! - Send log finalization failures

mod helpers;

pub use helpers::{encode_metrics, SendMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "email";

lazy_static! {
    /// Send attempts by outcome (sent, failed, rejected)
    pub static ref SENDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_sends_total", METRIC_PREFIX),
        "Total email send attempts by outcome",
        &["status"]
    ).unwrap();

    /// Time from template resolution to transport completion
    pub static ref SEND_DURATION: Histogram = register_histogram!(
        format!("{}_send_duration_seconds", METRIC_PREFIX),
        "Email send duration in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    pub static ref RENDER_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_render_failures_total", METRIC_PREFIX),
        "Total template render failures"
    ).unwrap();

    /// Sends served by the default-language template instead of the requested one
    pub static ref TEMPLATE_FALLBACKS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_fallbacks_total", METRIC_PREFIX),
        "Total fallbacks to the default language template"
    ).unwrap();

    /// Send logs left pending because the outcome could not be written
    pub static ref LOG_FINALIZE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_log_finalize_failures_total", METRIC_PREFIX),
        "Total send log finalization failures"
    ).unwrap();
}
